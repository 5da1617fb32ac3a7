//! HTTP interface for the lead exporter.
//!
//! Exposes account switching, token exchange, page and form discovery and
//! lead download as JSON endpoints over the shared [`AppState`].

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use error::{ApiError, Result};
pub use state::AppState;

/// Router with all routes, request tracing and state attached.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
