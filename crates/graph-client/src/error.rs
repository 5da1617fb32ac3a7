//! Error types for graph-client.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the Graph API.
#[derive(Debug, Error)]
pub enum GraphError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx response from the Graph API.
    #[error("Graph API error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Access token missing or too short to be real.
    #[error("Invalid or missing access token")]
    InvalidToken,

    /// Caller supplied an unusable argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation was cancelled while paused.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Graph error envelope: `{"error": {"message": ..., "type": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl GraphError {
    /// Build an upstream error from a status code and raw response body.
    ///
    /// The Graph error message is extracted when the body carries one,
    /// otherwise the (shortened) body text is used.
    pub fn upstream(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match (envelope.error.kind, envelope.error.code) {
                (Some(kind), Some(code)) => {
                    format!("{} ({} #{})", envelope.error.message, kind, code)
                }
                _ => envelope.error.message,
            },
            Err(_) => body.chars().take(200).collect(),
        };
        GraphError::Upstream { status, message }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GraphError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            GraphError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Message reported by the Graph API, if this error came from it.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            GraphError::Upstream { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_extracts_graph_message() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        let err = GraphError::upstream(400, body);
        assert_eq!(
            err.upstream_message(),
            Some("Invalid OAuth access token. (OAuthException #190)")
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_upstream_falls_back_to_body() {
        let err = GraphError::upstream(502, "Bad Gateway");
        assert_eq!(err.upstream_message(), Some("Bad Gateway"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_rate_limit_is_transient() {
        assert!(GraphError::upstream(429, "{}").is_transient());
        assert!(!GraphError::InvalidToken.is_transient());
    }
}
