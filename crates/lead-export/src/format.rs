//! Output format negotiation.

use chrono::{DateTime, SecondsFormat, Utc};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Json,
}

impl ExportFormat {
    /// Pick a format from the request's `format` field and `Accept` header.
    ///
    /// Excel wins when either asks for it; JSON is the fallback.
    pub fn negotiate(format: Option<&str>, accept: Option<&str>) -> Self {
        let wants_excel = format.is_some_and(|f| f.eq_ignore_ascii_case("excel"))
            || accept.is_some_and(|a| a.contains(XLSX_CONTENT_TYPE));
        if wants_excel {
            ExportFormat::Excel
        } else {
            ExportFormat::Json
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Excel => XLSX_CONTENT_TYPE,
            ExportFormat::Json => JSON_CONTENT_TYPE,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    /// Download name, e.g. `leads_2024-01-02T10:00:00.000Z.xlsx`.
    pub fn filename(&self, at: DateTime<Utc>) -> String {
        format!(
            "leads_{}.{}",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.extension()
        )
    }

    /// `Content-Disposition` header value for a download.
    pub fn content_disposition(&self, at: DateTime<Utc>) -> String {
        format!("attachment; filename=\"{}\"", self.filename(at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_negotiate() {
        assert_eq!(ExportFormat::negotiate(Some("excel"), None), ExportFormat::Excel);
        assert_eq!(
            ExportFormat::negotiate(None, Some(XLSX_CONTENT_TYPE)),
            ExportFormat::Excel
        );
        assert_eq!(
            ExportFormat::negotiate(Some("json"), Some("application/json")),
            ExportFormat::Json
        );
        assert_eq!(ExportFormat::negotiate(None, None), ExportFormat::Json);
        assert_eq!(
            ExportFormat::negotiate(Some("json"), Some(XLSX_CONTENT_TYPE)),
            ExportFormat::Excel
        );
    }

    #[test]
    fn test_filename() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(
            ExportFormat::Excel.filename(at),
            "leads_2024-01-02T10:00:00.000Z.xlsx"
        );
        assert_eq!(
            ExportFormat::Excel.content_disposition(at),
            "attachment; filename=\"leads_2024-01-02T10:00:00.000Z.xlsx\""
        );
    }
}
