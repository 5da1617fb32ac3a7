//! Graph API client for token exchange, page and form discovery.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::mask_token;
use crate::transport::{HttpTransport, Transport};
use crate::types::{LeadForm, ListResponse, Page, TokenResponse};

/// Client for the Graph API.
#[derive(Clone)]
pub struct GraphClient {
    transport: Arc<dyn Transport>,
    config: GraphConfig,
}

impl GraphClient {
    /// Create a client backed by a real HTTP transport.
    pub fn new(config: GraphConfig) -> Result<Self, GraphError> {
        let transport = HttpTransport::new(config.timeout)?;
        info!("Graph client configured for {}", config.base_url);
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: GraphConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Exchange a short-lived user token for a long-lived one.
    pub async fn exchange_token(
        &self,
        app_id: &str,
        app_secret: &str,
        short_lived_token: &str,
    ) -> Result<String, GraphError> {
        if app_id.is_empty() || app_secret.is_empty() || short_lived_token.is_empty() {
            return Err(GraphError::InvalidInput(
                "app id, app secret and short-lived token are required".to_string(),
            ));
        }

        let query = vec![
            ("grant_type".to_string(), "fb_exchange_token".to_string()),
            ("client_id".to_string(), app_id.to_string()),
            ("client_secret".to_string(), app_secret.to_string()),
            ("fb_exchange_token".to_string(), short_lived_token.to_string()),
        ];

        let response: TokenResponse = self.get(&self.config.token_exchange_url(), &query).await?;
        debug!(
            token = %mask_token(&response.access_token),
            expires_in = ?response.expires_in,
            "Exchanged token"
        );
        Ok(response.access_token)
    }

    /// List the pages the long-lived token can manage.
    pub async fn list_pages(&self, long_lived_token: &str) -> Result<Vec<Page>, GraphError> {
        if long_lived_token.is_empty() {
            return Err(GraphError::InvalidToken);
        }

        let query = vec![("access_token".to_string(), long_lived_token.to_string())];
        let response: ListResponse<Page> = self.get(&self.config.accounts_url(), &query).await?;
        debug!(count = response.data.len(), "Listed pages");
        Ok(response.data)
    }

    /// List the lead forms of a page.
    pub async fn list_forms(
        &self,
        page_id: &str,
        page_token: &str,
    ) -> Result<Vec<LeadForm>, GraphError> {
        if page_id.is_empty() {
            return Err(GraphError::InvalidInput("page id is required".to_string()));
        }
        if page_token.is_empty() {
            return Err(GraphError::InvalidToken);
        }

        let query = vec![("access_token".to_string(), page_token.to_string())];
        let response: ListResponse<LeadForm> =
            self.get(&self.config.forms_url(page_id), &query).await?;
        debug!(page_id, count = response.data.len(), "Listed lead forms");
        Ok(response.data)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// GET a URL and decode the body into `T`.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, GraphError> {
        let value = self.transport.get_json(url, query).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("config", &self.config)
            .finish()
    }
}
