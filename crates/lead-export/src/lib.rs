//! Tabular export of form leads.
//!
//! Leads are sorted newest first, flattened into a fixed set of columns and
//! rendered either as a spreadsheet or as the raw JSON array.
//!
//! # Example
//!
//! ```no_run
//! use lead_export::{ExportFormat, LeadExporter};
//!
//! # fn example(leads: Vec<graph_client::Lead>) -> Result<(), lead_export::ExportError> {
//! let exporter = LeadExporter::new();
//! let bytes = exporter.export(&leads, ExportFormat::Excel)?;
//! std::fs::write("leads.xlsx", bytes).ok();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod format;
pub mod schema;
pub mod xlsx;

use chrono::FixedOffset;
use graph_client::{regional_timezone, Lead};
use tracing::info;

pub use error::ExportError;
pub use format::{ExportFormat, JSON_CONTENT_TYPE, XLSX_CONTENT_TYPE};
pub use schema::{column_key, sort_newest_first, Column, LeadSheet, Schema, TEXT_COLUMNS};

/// Renders lead batches.
#[derive(Debug, Clone)]
pub struct LeadExporter {
    display_zone: FixedOffset,
}

impl Default for LeadExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadExporter {
    /// Exporter showing creation times in the regional timezone.
    pub fn new() -> Self {
        Self {
            display_zone: regional_timezone(),
        }
    }

    pub fn with_display_zone(mut self, zone: FixedOffset) -> Self {
        self.display_zone = zone;
        self
    }

    /// Flatten `leads` into rows.
    pub fn sheet(&self, leads: &[Lead]) -> LeadSheet {
        LeadSheet::build(leads, &self.display_zone)
    }

    /// Render a workbook.
    pub fn to_spreadsheet(&self, leads: &[Lead]) -> Result<Vec<u8>, ExportError> {
        xlsx::write_workbook(&self.sheet(leads))
    }

    /// The leads as a JSON array, newest first.
    pub fn to_json(&self, leads: &[Lead]) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec(&sort_newest_first(leads))?)
    }

    pub fn export(&self, leads: &[Lead], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        let bytes = match format {
            ExportFormat::Excel => self.to_spreadsheet(leads)?,
            ExportFormat::Json => self.to_json(leads)?,
        };
        info!(leads = leads.len(), ?format, bytes = bytes.len(), "Exported leads");
        Ok(bytes)
    }
}
