//! Workbook writer - in-memory grid → .xlsx
//!
//! Merged ranges are laid down first with an empty shared value; cell
//! writes follow and overwrite the merge anchors with their real values.

use crate::error::{IntakeError, IntakeResult};
use crate::grid::{CellValue, Workbook};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::path::Path;

/// Writes the whole grid model to a .xlsx file
pub struct WorkbookWriter {
    path: std::path::PathBuf,
}

impl WorkbookWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn write(&self, workbook: &Workbook) -> IntakeResult<()> {
        let mut output = XlsxWorkbook::new();

        // A valid .xlsx needs at least one worksheet
        if workbook.is_empty() {
            output.add_worksheet();
        }

        for sheet in workbook.sheets() {
            let worksheet = output.add_worksheet();
            worksheet
                .set_name(sheet.name())
                .map_err(|e| IntakeError::Save(format!("Invalid sheet name: {}", e)))?;

            let merge_format = Format::new();
            for merged in sheet.merged_ranges() {
                if merged.is_single_cell() {
                    continue;
                }
                worksheet
                    .merge_range(
                        merged.min_row - 1,
                        column_index(merged.min_col)?,
                        merged.max_row - 1,
                        column_index(merged.max_col)?,
                        "",
                        &merge_format,
                    )
                    .map_err(|e| {
                        IntakeError::Save(format!("Failed to merge {}: {}", merged, e))
                    })?;
            }

            for (row, col, value) in sheet.cells() {
                let target_row = row - 1;
                let target_col = column_index(col)?;
                match value {
                    CellValue::Text(s) => worksheet.write_string(target_row, target_col, s),
                    CellValue::Number(n) => worksheet.write_number(target_row, target_col, *n),
                    CellValue::Bool(b) => worksheet.write_boolean(target_row, target_col, *b),
                }
                .map_err(|e| {
                    IntakeError::Save(format!(
                        "Failed to write cell ({}, {}) on '{}': {}",
                        row,
                        col,
                        sheet.name(),
                        e
                    ))
                })?;
            }
        }

        output
            .save(&self.path)
            .map_err(|e| IntakeError::Save(format!("Failed to save workbook: {}", e)))?;

        Ok(())
    }
}

/// Grid columns are 1-based u32; the writer wants 0-based u16
fn column_index(col: u32) -> IntakeResult<u16> {
    u16::try_from(col - 1)
        .map_err(|_| IntakeError::Save(format!("Column {} out of range for .xlsx", col)))
}
