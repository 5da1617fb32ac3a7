//! Account listing and switching.

use accounts::AccountSummary;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::routes::present;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsQuery {
    pub set_current_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsResponse {
    pub success: bool,
    pub accounts: Vec<AccountSummary>,
    pub current_account_id: String,
}

/// List accounts, optionally switching the current one first.
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<AccountsResponse>> {
    let store = state.store();

    if let Some(id) = present(query.set_current_id) {
        if !store.set_current(&id).await? {
            return Err(ApiError::NotFound(
                "Account not found with the provided ID".to_string(),
            ));
        }
    } else {
        // Applies the first-account default before listing.
        store.current().await?;
    }

    let (accounts, current_account_id) = store.summaries().await?;
    Ok(Json(AccountsResponse {
        success: true,
        accounts,
        current_account_id,
    }))
}
