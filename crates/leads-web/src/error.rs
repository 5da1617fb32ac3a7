//! Error types for the lead export web interface.

use accounts::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use graph_client::GraphError;
use lead_export::ExportError;
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request input.
    #[error("{0}")]
    Validation(String),

    /// Request body could not be decoded.
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    /// No token available for the request.
    #[error("{0}")]
    Unauthorized(String),

    /// A token was supplied but is not usable.
    #[error("{0}")]
    BadToken(String),

    #[error("{0}")]
    NotFound(String),

    /// The Graph API call failed.
    #[error("{context}")]
    Upstream {
        context: String,
        #[source]
        source: GraphError,
    },

    #[error("Account store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl ApiError {
    /// Wrap a Graph failure with a description of what was attempted.
    ///
    /// Input errors raised before any request was sent map to 400s.
    pub fn graph(context: impl Into<String>, err: GraphError) -> Self {
        match err {
            GraphError::InvalidToken => {
                ApiError::BadToken("Invalid access token format".to_string())
            }
            GraphError::InvalidInput(message) => ApiError::Validation(message),
            source => ApiError::Upstream {
                context: context.into(),
                source,
            },
        }
    }

    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::Body(_) => "validation",
            ApiError::Unauthorized(_) | ApiError::BadToken(_) => "auth",
            ApiError::NotFound(_) => "not_found",
            ApiError::Upstream { .. } => "upstream",
            ApiError::Store(_) | ApiError::Export(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Body(_) | ApiError::BadToken(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Store(_) | ApiError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            ApiError::Upstream { context, source } => {
                tracing::error!(error = %source, "{}", context);
                Some(
                    source
                        .upstream_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| source.to_string()),
                )
            }
            ApiError::Store(err) => {
                tracing::error!("Account store error: {}", err);
                None
            }
            ApiError::Export(err) => {
                tracing::error!("Export error: {}", err);
                None
            }
            other => {
                tracing::debug!(kind = other.kind(), "Rejected request: {}", other);
                None
            }
        };

        let mut body = serde_json::json!({
            "kind": self.kind(),
            "error": self.to_string(),
        });
        if let Some(details) = details {
            body["details"] = serde_json::Value::String(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::BadToken("x".into()).kind(), "auth");
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_graph_error_mapping() {
        let err = ApiError::graph("Failed", GraphError::InvalidToken);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "auth");

        let err = ApiError::graph("Failed", GraphError::InvalidInput("formId".into()));
        assert_eq!(err.kind(), "validation");

        let err = ApiError::graph(
            "Failed to fetch leads",
            GraphError::Upstream {
                status: 400,
                message: "Invalid OAuth access token".into(),
            },
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "upstream");
        assert_eq!(err.to_string(), "Failed to fetch leads");
    }
}
