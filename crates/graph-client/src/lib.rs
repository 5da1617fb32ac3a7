//! Graph lead-generation API client library.
//!
//! This crate provides a Rust client for the advertising Graph API used to
//! export form leads. It supports:
//!
//! - Exchanging short-lived user tokens for long-lived ones
//! - Discovering pages and their lead forms
//! - Following the cursor-paginated leads endpoint up to a cap
//! - Turning named time filters into date windows
//!
//! # Example
//!
//! ```no_run
//! use graph_client::{GraphClient, GraphConfig, LeadFetcher, LeadQuery, TimeFilter};
//!
//! # async fn example() -> Result<(), graph_client::GraphError> {
//! let client = GraphClient::new(GraphConfig::default())?;
//! let fetcher = LeadFetcher::new(client);
//!
//! let query = LeadQuery::new(TimeFilter::Yesterday).with_max_leads(500);
//! let batch = fetcher.fetch_all("1234567890", "EAAB...page-token...", &query).await?;
//! println!("{} leads, more available: {}", batch.leads.len(), batch.has_more());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod retry;
pub mod transport;
pub mod types;
pub mod window;

pub use client::GraphClient;
pub use config::GraphConfig;
pub use error::GraphError;
pub use fetch::{
    validate_token, FetchOptions, LeadBatch, LeadFetcher, LeadQuery, DEFAULT_MAX_LEADS,
    MIN_TOKEN_LEN,
};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport};
pub use types::*;
pub use window::{
    regional_timezone, CustomRangePolicy, DateWindow, QueryRange, TimeFilter, WindowCalculator,
    WindowError,
};

/// Shorten a token for logs: first 10 characters followed by `...`.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "none".to_string();
    }
    let prefix: String = token.chars().take(10).collect();
    format!("{}...", prefix)
}

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(""), "none");
        assert_eq!(mask_token("EAABsbCS1iHgBAKZ"), "EAABsbCS1i...");
        assert_eq!(mask_token("abc"), "abc...");
    }
}
