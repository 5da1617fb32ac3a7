//! HTTP transport seam.
//!
//! Every Graph call goes through [`Transport`], so tests can script upstream
//! responses without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::GraphError;

/// Performs a GET and returns the decoded JSON body.
///
/// Implementations must map non-2xx responses to [`GraphError::Upstream`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET against `url` with the given query pairs appended.
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, GraphError>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, GraphError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GraphError::Http)?;
        Ok(Self { http })
    }

    /// Get the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, GraphError> {
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(GraphError::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(GraphError::Http)?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Graph request failed");
            return Err(GraphError::upstream(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish()
    }
}
