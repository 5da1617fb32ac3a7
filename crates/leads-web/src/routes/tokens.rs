//! Token exchange and page selection.

use accounts::TokenUpdate;
use axum::extract::{Query, State};
use axum::Json;
use graph_client::{mask_token, Page};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::routes::present;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    pub long_lived_token: String,
}

/// Exchange the current account's short-lived token for a long-lived one.
pub async fn convert_token(State(state): State<AppState>) -> Result<Json<ConvertResponse>> {
    let account = state
        .store()
        .current()
        .await?
        .ok_or_else(|| ApiError::Validation("No account selected or available".to_string()))?;

    if account.app_id.is_empty()
        || account.app_secret.is_empty()
        || account.short_lived_token.is_empty()
    {
        return Err(ApiError::Validation(
            "Missing credentials in the current account".to_string(),
        ));
    }

    let long_lived_token = state
        .graph
        .exchange_token(&account.app_id, &account.app_secret, &account.short_lived_token)
        .await
        .map_err(|err| ApiError::graph("Failed to convert token", err))?;

    state
        .resolver
        .persist(TokenUpdate::long_lived(long_lived_token.clone()))
        .await?;

    info!(
        account_id = %account.id,
        token = %mask_token(&long_lived_token),
        "Converted token"
    );

    Ok(Json(ConvertResponse {
        success: true,
        long_lived_token,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTokenQuery {
    pub long_lived_token: Option<String>,
    pub page_id: Option<String>,
    pub page_index: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTokenResponse {
    pub success: bool,
    pub page_token: String,
    pub page_id: String,
    pub page_name: String,
}

/// Pick a page by id, then by index, else the first one.
pub fn select_page<'a>(
    pages: &'a [Page],
    page_id: Option<&str>,
    page_index: Option<usize>,
) -> Result<&'a Page> {
    if let Some(id) = page_id {
        return pages
            .iter()
            .find(|page| page.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Page with ID {} not found", id)));
    }
    page_index
        .and_then(|index| pages.get(index))
        .or_else(|| pages.first())
        .ok_or_else(|| ApiError::NotFound("No pages found".to_string()))
}

/// Parse a page index the lenient way: leading digits only, negatives ignored.
pub fn parse_index(raw: &str) -> Option<usize> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Select a page, cache its token and record it on the current account.
pub async fn page_token(
    State(state): State<AppState>,
    Query(query): Query<PageTokenQuery>,
) -> Result<Json<PageTokenResponse>> {
    let long_lived_token = match present(query.long_lived_token) {
        Some(token) => token,
        None => state.resolver.resolve().await?.long_lived_token,
    };
    if long_lived_token.is_empty() {
        return Err(ApiError::Validation(
            "No long-lived token provided".to_string(),
        ));
    }

    let account = state
        .store()
        .current()
        .await?
        .ok_or_else(|| ApiError::Validation("No account selected or available".to_string()))?;

    let pages = state
        .graph
        .list_pages(&long_lived_token)
        .await
        .map_err(|err| ApiError::graph("Failed to fetch page token", err))?;
    if pages.is_empty() {
        return Err(ApiError::NotFound("No pages found".to_string()));
    }

    let page_id = present(query.page_id);
    let page_index = query.page_index.as_deref().and_then(parse_index);
    let page = select_page(&pages, page_id.as_deref(), page_index)?.clone();

    // Index into the account's own page list, which resolution reads from.
    // Known pages get their token refreshed by `persist`.
    let stored_index = match account.pages.iter().position(|p| p.id == page.id) {
        Some(index) => index,
        None => state
            .store()
            .update_page(&account.id, page.clone())
            .await?
            .and_then(|updated| updated.pages.iter().position(|p| p.id == page.id))
            .unwrap_or(account.pages.len()),
    };

    state
        .resolver
        .persist(TokenUpdate::page(&page, stored_index).with_long_lived(long_lived_token))
        .await?;

    info!(
        account_id = %account.id,
        page_id = %page.id,
        page_index = stored_index,
        "Selected page"
    );

    Ok(Json(PageTokenResponse {
        success: true,
        page_token: page.access_token,
        page_id: page.id,
        page_name: page.name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<Page> {
        ["a", "b", "c"]
            .iter()
            .map(|id| Page {
                id: id.to_string(),
                name: format!("Page {}", id),
                access_token: format!("token-{}", id),
            })
            .collect()
    }

    #[test]
    fn test_select_by_id_first() {
        let pages = pages();
        assert_eq!(select_page(&pages, Some("c"), Some(0)).unwrap().id, "c");
        assert!(matches!(
            select_page(&pages, Some("zzz"), None),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_select_by_index_then_first() {
        let pages = pages();
        assert_eq!(select_page(&pages, None, Some(1)).unwrap().id, "b");
        assert_eq!(select_page(&pages, None, Some(9)).unwrap().id, "a");
        assert_eq!(select_page(&pages, None, None).unwrap().id, "a");
        assert!(select_page(&[], None, None).is_err());
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("2"), Some(2));
        assert_eq!(parse_index(" 3rd"), Some(3));
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("x"), None);
    }
}
