//! Fixed delays between destination calls.

use std::time::Duration;

/// Delays inserted after destination calls to stay under its rate limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After each page of existing records while indexing.
    pub index_page_delay: Duration,
    /// After each batch write call.
    pub batch_delay: Duration,
    /// After each source page has been flushed.
    pub source_page_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            index_page_delay: Duration::from_millis(200),
            batch_delay: Duration::from_millis(500),
            source_page_delay: Duration::from_millis(500),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            index_page_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            source_page_delay: Duration::ZERO,
        }
    }
}

pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
