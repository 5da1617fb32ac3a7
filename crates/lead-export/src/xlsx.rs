//! Workbook rendering.

use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use tracing::debug;

use crate::error::ExportError;
use crate::schema::LeadSheet;

pub const SHEET_NAME: &str = "Leads";
pub const COLUMN_WIDTH: f64 = 20.0;
const HEADER_FILL: u32 = 0xE0E0E0;

/// Render `sheet` as a single-worksheet workbook.
///
/// Every value is written as a string cell so leading zeros and long
/// digit runs survive. Text columns additionally carry the `@` number
/// format, so values typed into them later stay text too.
pub fn write_workbook(sheet: &LeadSheet) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL));
    let text = Format::new().set_num_format("@");

    for (index, column) in sheet.columns.iter().enumerate() {
        let col = col_num(index)?;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
        worksheet.write_string_with_format(0, col, column.header.as_str(), &header)?;
    }

    for (index, values) in sheet.rows.iter().enumerate() {
        let row = row_num(index + 1)?;
        for (col_index, (column, value)) in sheet.columns.iter().zip(values).enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = col_num(col_index)?;
            if column.is_text() {
                worksheet.write_string_with_format(row, col, value.as_str(), &text)?;
            } else {
                worksheet.write_string(row, col, value.as_str())?;
            }
        }
    }

    if !sheet.columns.is_empty() {
        let last_col = col_num(sheet.columns.len() - 1)?;
        let last_row = row_num(sheet.rows.len())?;
        worksheet.autofilter(0, 0, last_row, last_col)?;
    }

    let buffer = workbook.save_to_buffer()?;
    debug!(
        rows = sheet.rows.len(),
        columns = sheet.columns.len(),
        bytes = buffer.len(),
        "Rendered workbook"
    );
    Ok(buffer)
}

fn row_num(index: usize) -> Result<u32, ExportError> {
    u32::try_from(index).map_err(|_| ExportError::TooLarge("rows"))
}

fn col_num(index: usize) -> Result<u16, ExportError> {
    u16::try_from(index).map_err(|_| ExportError::TooLarge("columns"))
}
