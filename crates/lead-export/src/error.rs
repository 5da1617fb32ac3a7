//! Error types for lead export.

use thiserror::Error;

/// Errors that can occur while serializing leads.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Workbook generation failed.
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The sheet does not fit in a worksheet.
    #[error("Too many {0} for a worksheet")]
    TooLarge(&'static str),
}
