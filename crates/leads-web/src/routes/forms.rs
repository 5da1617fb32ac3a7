//! Lead form listing.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use graph_client::LeadForm;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::routes::present;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormsQuery {
    pub page_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFormsRequest {
    pub page_id: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormsResponse {
    pub success: bool,
    pub forms: Vec<LeadForm>,
    pub page_id: String,
}

/// Forms of the requested page, or of the selected page.
///
/// When a page id is given but no page token is cached, the token stored
/// for that page on the current account is used.
pub async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<FormsQuery>,
) -> Result<Json<FormsResponse>> {
    let context = state.resolver.resolve().await?;
    let requested = present(query.page_id);

    let mut page_id = requested.clone().unwrap_or(context.page_id);
    let mut page_token = context.page_token;

    if let Some(requested) = &requested {
        if page_token.is_empty() {
            if let Some(account) = state.store().current().await? {
                if let Some(page) = account.page(requested) {
                    debug!(page_id = %page.id, "Using stored page token");
                    page_token = page.access_token.clone();
                    page_id = page.id.clone();
                }
            }
        }
    }

    if page_token.is_empty() || page_id.is_empty() {
        return Err(ApiError::Validation(
            "No page token or page ID available".to_string(),
        ));
    }

    let forms = state
        .graph
        .list_forms(&page_id, &page_token)
        .await
        .map_err(|err| ApiError::graph("Failed to fetch lead forms", err))?;

    Ok(Json(FormsResponse {
        success: true,
        forms,
        page_id,
    }))
}

/// Forms of a page using a manually supplied token.
pub async fn list_forms_manual(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ManualFormsRequest>, JsonRejection>,
) -> Result<Json<FormsResponse>> {
    let Json(request) = payload?;
    let (Some(page_id), Some(access_token)) =
        (present(request.page_id), present(request.access_token))
    else {
        return Err(ApiError::Validation(
            "Page ID and access token are required".to_string(),
        ));
    };

    let forms = state
        .graph
        .list_forms(&page_id, &access_token)
        .await
        .map_err(|err| ApiError::graph("Failed to fetch forms with manual token", err))?;

    Ok(Json(FormsResponse {
        success: true,
        forms,
        page_id,
    }))
}
