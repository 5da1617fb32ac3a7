//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use accounts::{StoreMode, DEFAULT_ACCOUNTS_PATH};
use graph_client::config::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use graph_client::{CustomRangePolicy, GraphConfig, RetryPolicy};

const DEFAULT_ADDR: &str = "127.0.0.1:8790";

/// Lead export server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Account document path.
    pub accounts_path: PathBuf,
    /// Whether account changes are written back to disk.
    pub store_mode: StoreMode,
    /// Graph API connection settings.
    pub graph: GraphConfig,
    /// Retry behavior for lead pages.
    pub retry: RetryPolicy,
    /// Handling of bad custom date ranges.
    pub range_policy: CustomRangePolicy,
    /// Page token to seed the session cache with.
    pub page_token: Option<String>,
    /// Page id to seed the session cache with.
    pub page_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `LEADS_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `ACCOUNTS_PATH` | Account document path | `accounts.json` |
    /// | `ACCOUNTS_EPHEMERAL` | Keep account changes in memory only | `false` |
    /// | `GRAPH_API_URL` | Graph API base URL | `https://graph.facebook.com` |
    /// | `GRAPH_API_VERSION` | Version segment for the leads endpoint | `v19.0` |
    /// | `GRAPH_TIMEOUT_SECS` | HTTP timeout | `30` |
    /// | `GRAPH_PAGE_TOKEN` | Initial page token | (none) |
    /// | `GRAPH_PAGE_ID` | Initial page id | (none) |
    /// | `LEADS_RETRY_ATTEMPTS` | Retries per lead page, 0 fails fast | `0` |
    /// | `LEADS_RETRY_BASE_MS` | First retry delay | `500` |
    /// | `LEADS_STRICT_CUSTOM_DATES` | Reject bad custom ranges | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr: SocketAddr = lookup("LEADS_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let accounts_path: PathBuf = lookup("ACCOUNTS_PATH")
            .unwrap_or_else(|| DEFAULT_ACCOUNTS_PATH.to_string())
            .into();

        let store_mode = if parse_bool(&lookup, "ACCOUNTS_EPHEMERAL")? {
            StoreMode::Ephemeral
        } else {
            StoreMode::Persistent
        };

        let timeout = parse_number(&lookup, "GRAPH_TIMEOUT_SECS", 30)?;
        let graph = GraphConfig::new(
            lookup("GRAPH_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )
        .with_version(
            lookup("GRAPH_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        )
        .with_timeout(Duration::from_secs(timeout));

        let attempts = parse_number(&lookup, "LEADS_RETRY_ATTEMPTS", 0)?;
        let base_ms = parse_number(&lookup, "LEADS_RETRY_BASE_MS", 500)?;
        let retry = RetryPolicy::exponential(
            u32::try_from(attempts).map_err(|_| ConfigError::InvalidNumber {
                var: "LEADS_RETRY_ATTEMPTS",
                value: attempts.to_string(),
            })?,
            Duration::from_millis(base_ms),
        );

        let range_policy = if parse_bool(&lookup, "LEADS_STRICT_CUSTOM_DATES")? {
            CustomRangePolicy::Strict
        } else {
            CustomRangePolicy::Lenient
        };

        let page_token = lookup("GRAPH_PAGE_TOKEN").filter(|v| !v.is_empty());
        let page_id = lookup("GRAPH_PAGE_ID").filter(|v| !v.is_empty());

        Ok(Self {
            addr,
            accounts_path,
            store_mode,
            graph,
            retry,
            range_policy,
            page_token,
            page_id,
        })
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        _ => Err(ConfigError::InvalidBool { var, value }),
    }
}

fn parse_number<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid LEADS_ADDR format")]
    InvalidAddr,

    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be true or false, got '{value}'")]
    InvalidBool { var: &'static str, value: String },
}
