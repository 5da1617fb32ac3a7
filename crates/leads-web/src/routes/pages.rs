//! Page discovery.

use axum::extract::{Query, State};
use axum::Json;
use graph_client::Page;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::routes::present;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesQuery {
    pub account_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PagesResponse {
    pub success: bool,
    pub pages: Vec<Page>,
}

/// Pages of an account: the stored list, or discovered and stored on first use.
pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<PagesQuery>,
) -> Result<Json<PagesResponse>> {
    let store = state.store();
    let account = match present(query.account_id) {
        Some(id) => store.get_by_id(&id).await?,
        None => store.current().await?,
    }
    .ok_or_else(|| {
        ApiError::Validation(
            "No account found with the provided ID or no current account available".to_string(),
        )
    })?;

    if !account.has_long_lived_token() {
        return Err(ApiError::Validation(
            "No long-lived token available for this account".to_string(),
        ));
    }

    if !account.pages.is_empty() {
        debug!(account_id = %account.id, count = account.pages.len(), "Using stored pages");
        return Ok(Json(PagesResponse {
            success: true,
            pages: account.pages,
        }));
    }

    let pages = state
        .graph
        .list_pages(&account.long_lived_token)
        .await
        .map_err(|err| ApiError::graph("Failed to fetch pages", err))?;

    for page in &pages {
        store.update_page(&account.id, page.clone()).await?;
    }
    info!(account_id = %account.id, count = pages.len(), "Discovered pages");

    Ok(Json(PagesResponse {
        success: true,
        pages,
    }))
}
