//! Bitable (Feishu / Lark Base) HTTP client.
//!
//! [`BitableClient`] implements [`base_sink::BaseSink`] against the Bitable
//! open API, authenticating with a personal base token. Every response is a
//! `{code, msg, data}` envelope; a non-zero `code` is reported as
//! [`SinkError::Api`](base_sink::SinkError::Api) carrying `msg`.

mod client;
mod wire;

use std::time::Duration;

pub use client::BitableClient;
pub use wire::field_value_from_json;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which deployment of the service the app lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    /// Feishu (mainland China)
    #[default]
    Domestic,
    /// Lark (international)
    Overseas,
}

impl Region {
    pub fn api_base_url(self) -> &'static str {
        match self {
            Region::Domestic => "https://base-api.feishu.cn",
            Region::Overseas => "https://base-api.larksuite.com",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Region::Domestic => "Feishu",
            Region::Overseas => "Lark",
        }
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domestic" => Ok(Region::Domestic),
            "overseas" => Ok(Region::Overseas),
            other => Err(format!(
                "unknown region '{other}', expected 'domestic' or 'overseas'"
            )),
        }
    }
}

/// Destination connection options
#[derive(Clone, Debug)]
pub struct BaseOpts {
    /// App (base) token the tables live under
    pub app_token: String,
    /// Personal base token used as bearer credential
    pub personal_base_token: String,
    pub region: Region,
    /// Overrides the region's API base URL
    pub api_url: Option<String>,
    pub timeout: Duration,
}

impl BaseOpts {
    pub fn new(app_token: impl Into<String>, personal_base_token: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            personal_base_token: personal_base_token.into(),
            region: Region::default(),
            api_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> String {
        self.api_url
            .as_deref()
            .unwrap_or(self.region.api_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}
