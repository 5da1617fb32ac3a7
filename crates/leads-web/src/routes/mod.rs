//! Route handlers for the lead export interface.

pub mod accounts;
pub mod forms;
pub mod health;
pub mod leads;
pub mod pages;
pub mod tokens;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Accounts and tokens
        .route("/api/accounts", get(accounts::list_accounts))
        .route("/api/convert-token", get(tokens::convert_token))
        .route("/api/page-token", get(tokens::page_token))
        // Discovery
        .route("/api/pages", get(pages::list_pages))
        .route(
            "/api/lead-forms",
            get(forms::list_forms).post(forms::list_forms_manual),
        )
        // Export
        .route("/api/download-leads", post(leads::download_leads))
}

/// Treat empty strings from query parameters and bodies as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
