//! Configuration types for graph-client.

use std::time::Duration;

/// Default Graph API host.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Default API version used for the leads endpoint.
pub const DEFAULT_API_VERSION: &str = "v19.0";

/// Configuration for connecting to the Graph API.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Base URL of the API (e.g., "https://graph.facebook.com").
    pub base_url: String,
    /// Version path segment for versioned endpoints.
    pub api_version: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl GraphConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API version segment.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the token exchange endpoint URL.
    pub fn token_exchange_url(&self) -> String {
        format!("{}/oauth/access_token", self.base_url)
    }

    /// Get the page listing endpoint URL.
    pub fn accounts_url(&self) -> String {
        format!("{}/me/accounts", self.base_url)
    }

    /// Get the lead form listing endpoint URL for a page.
    pub fn forms_url(&self, page_id: &str) -> String {
        format!(
            "{}/{}/leadgen_forms",
            self.base_url,
            urlencoding::encode(page_id)
        )
    }

    /// Get the leads endpoint URL for a form.
    pub fn leads_url(&self, form_id: &str) -> String {
        format!(
            "{}/{}/{}/leads",
            self.base_url,
            self.api_version,
            urlencoding::encode(form_id)
        )
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
