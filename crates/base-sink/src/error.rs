//! Error types for destination calls.

use thiserror::Error;

/// Errors a destination call can fail with.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The destination answered and rejected the request.
    #[error("destination rejected request (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The destination could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl SinkError {
    /// The destination's own message when it reported one, else the error text.
    pub fn message(&self) -> String {
        match self {
            SinkError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_prefers_destination_text() {
        let err = SinkError::Api {
            code: 1254045,
            message: "FieldNameNotFound".into(),
        };
        assert_eq!(err.message(), "FieldNameNotFound");
        assert!(err.to_string().contains("1254045"));

        let err = SinkError::Transport("connection refused".into());
        assert_eq!(err.message(), "transport error: connection refused");
    }
}
