//! Wire types exchanged with the Graph API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One named answer on a lead form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadField {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A lead submitted through a lead form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    /// Creation time as sent by the API (e.g. `2024-01-02T10:00:00+0000`).
    pub created_time: String,
    #[serde(default)]
    pub field_data: Vec<LeadField>,
}

impl Lead {
    /// Parse the creation time.
    ///
    /// Accepts both the Graph `+0000` offset style and RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_graph_time(&self.created_time)
    }

    /// First value of the named field, if present.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.field_data
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.values.first())
            .map(String::as_str)
    }
}

/// Parse a Graph timestamp.
pub fn parse_graph_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A page the authenticated user manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub access_token: String,
}

/// A lead-collection form attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadForm {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_time: String,
}

/// Cursor links returned with list responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Generic `{ data, paging }` list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> ListResponse<T> {
    /// Cursor URL for the next page, ignoring empty strings.
    pub fn next_cursor(&self) -> Option<String> {
        self.paging
            .as_ref()
            .and_then(|paging| paging.next.clone())
            .filter(|next| !next.is_empty())
    }
}

/// Token exchange response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_graph_offset_time() {
        let parsed = parse_graph_time("2024-01-02T10:00:00+0000").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-02T10:00:00+00:00");
    }

    #[test]
    fn test_parse_rfc3339_time() {
        let parsed = parse_graph_time("2024-01-02T15:30:00+05:30").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-02T10:00:00+00:00");
    }

    #[test]
    fn test_parse_garbage_time() {
        assert!(parse_graph_time("yesterday-ish").is_none());
    }

    #[test]
    fn test_lead_deserializes_without_field_data() {
        let lead: Lead =
            serde_json::from_str(r#"{"id":"1","created_time":"2024-01-02T10:00:00+0000"}"#)
                .unwrap();
        assert!(lead.field_data.is_empty());
        assert!(lead.created_at().is_some());
    }

    #[test]
    fn test_first_value() {
        let lead = Lead {
            id: "1".to_string(),
            created_time: String::new(),
            field_data: vec![LeadField {
                name: "Email".to_string(),
                values: vec!["a@b.c".to_string(), "d@e.f".to_string()],
            }],
        };
        assert_eq!(lead.first_value("Email"), Some("a@b.c"));
        assert_eq!(lead.first_value("Phone"), None);
    }

    #[test]
    fn test_next_cursor_ignores_empty() {
        let response: ListResponse<Lead> =
            serde_json::from_str(r#"{"data":[],"paging":{"next":""}}"#).unwrap();
        assert!(response.next_cursor().is_none());

        let response: ListResponse<Lead> =
            serde_json::from_str(r#"{"data":[],"paging":{"next":"https://x/next"}}"#).unwrap();
        assert_eq!(response.next_cursor().as_deref(), Some("https://x/next"));
    }
}
