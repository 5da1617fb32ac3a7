//! Lead download.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use graph_client::{mask_token, validate_token, Lead, LeadQuery, TimeFilter};
use lead_export::ExportFormat;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::routes::present;
use crate::state::AppState;

pub const DEFAULT_LEAD_LIMIT: usize = 300;
pub const MIN_LEAD_LIMIT: usize = 100;
pub const MAX_LEAD_LIMIT: usize = 5000;

/// Download request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub form_id: Option<String>,
    pub time_filter: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `excel` selects a workbook; anything else falls back to JSON.
    pub format: Option<String>,
    /// Number or numeric string.
    pub max_leads: Option<Value>,
    /// Leads to export as-is instead of fetching.
    pub pre_filtered_leads: Option<Vec<Lead>>,
    /// Overrides the resolved page token.
    pub access_token: Option<String>,
}

/// Effective lead cap: default 300, clamped to 100..=5000.
///
/// Strings are read up to the first non-digit; zero and unreadable values
/// mean the default.
pub fn lead_limit(value: Option<&Value>) -> usize {
    let requested = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => leading_int(s),
        _ => None,
    };

    let limit = requested
        .filter(|n| *n != 0)
        .unwrap_or(DEFAULT_LEAD_LIMIT as i64);
    limit.clamp(MIN_LEAD_LIMIT as i64, MAX_LEAD_LIMIT as i64) as usize
}

fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

/// Validate, fetch (unless leads were supplied) and export.
pub async fn download_leads(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;

    let form_id = present(request.form_id)
        .ok_or_else(|| ApiError::Validation("formId is required".to_string()))?;
    let filter: TimeFilter = present(request.time_filter)
        .ok_or_else(|| ApiError::Validation("timeFilter is required".to_string()))?
        .parse()
        .map_err(|_| ApiError::Validation("Invalid timeFilter value".to_string()))?;

    let start_date = present(request.start_date);
    let end_date = present(request.end_date);
    if filter == TimeFilter::Custom && (start_date.is_none() || end_date.is_none()) {
        return Err(ApiError::Validation(
            "startDate and endDate are required for custom timeFilter".to_string(),
        ));
    }

    let max_leads = lead_limit(request.max_leads.as_ref());

    let token = match present(request.access_token) {
        Some(token) => token,
        None => state.resolver.resolve().await?.page_token,
    };
    if token.is_empty() {
        return Err(ApiError::Unauthorized(
            "No access token available. Please provide a manual access token.".to_string(),
        ));
    }
    validate_token(&token)
        .map_err(|_| ApiError::BadToken("Invalid access token format".to_string()))?;

    let pre_filtered = request.pre_filtered_leads.filter(|leads| !leads.is_empty());
    info!(
        form_id = %form_id,
        filter = %filter,
        max_leads,
        pre_filtered = ?pre_filtered.as_ref().map(Vec::len),
        token = %mask_token(&token),
        "Lead download requested"
    );

    let leads = match pre_filtered {
        Some(leads) => leads,
        None => {
            let query = LeadQuery {
                filter,
                start_date,
                end_date,
                max_leads,
            };
            state
                .fetcher
                .fetch_all(&form_id, &token, &query)
                .await
                .map_err(|err| ApiError::graph("Failed to fetch leads from Facebook", err))?
                .leads
        }
    };

    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let format = ExportFormat::negotiate(request.format.as_deref(), accept);
    let body = state.exporter.export(&leads, format)?;

    let response = match format {
        ExportFormat::Excel => (
            [
                (header::CONTENT_TYPE, format.content_type().to_string()),
                (header::CONTENT_DISPOSITION, format.content_disposition(Utc::now())),
            ],
            body,
        )
            .into_response(),
        ExportFormat::Json => (
            [(header::CONTENT_TYPE, format.content_type().to_string())],
            body,
        )
            .into_response(),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_limit_default_and_clamp() {
        assert_eq!(lead_limit(None), 300);
        assert_eq!(lead_limit(Some(&Value::Null)), 300);
        assert_eq!(lead_limit(Some(&json!(50))), 100);
        assert_eq!(lead_limit(Some(&json!(250))), 250);
        assert_eq!(lead_limit(Some(&json!(99999))), 5000);
        assert_eq!(lead_limit(Some(&json!(0))), 300);
        assert_eq!(lead_limit(Some(&json!(-20))), 100);
        assert_eq!(lead_limit(Some(&json!(1200.7))), 1200);
    }

    #[test]
    fn test_lead_limit_strings() {
        assert_eq!(lead_limit(Some(&json!("1000"))), 1000);
        assert_eq!(lead_limit(Some(&json!(" 750 leads"))), 750);
        assert_eq!(lead_limit(Some(&json!("lots"))), 300);
        assert_eq!(lead_limit(Some(&json!(""))), 300);
        assert_eq!(lead_limit(Some(&json!(true))), 300);
    }
}
