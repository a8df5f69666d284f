//! Workbook reader - .xlsx → in-memory grid
//!
//! calamine surfaces cached formula results, so a sheet full of computed
//! cells reads as plain values here. Cell addresses convert from the
//! range-relative 0-based coordinates to the grid's absolute 1-based ones.

use crate::error::{IntakeError, IntakeResult};
use crate::grid::{CellValue, MergedRange, Sheet, Workbook};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// Reads a whole .xlsx workbook, merged regions included
pub struct WorkbookReader {
    path: std::path::PathBuf,
}

impl WorkbookReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read every sheet into the grid model
    pub fn read(&self) -> IntakeResult<Workbook> {
        let mut source: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e| IntakeError::Workbook(format!("Failed to open workbook: {}", e)))?;

        source
            .load_merged_regions()
            .map_err(|e| IntakeError::Workbook(format!("Failed to load merged regions: {}", e)))?;

        let sheet_names = source.sheet_names().to_vec();
        let mut workbook = Workbook::new();

        for sheet_name in sheet_names {
            let range = source.worksheet_range(&sheet_name).map_err(|e| {
                IntakeError::Workbook(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;

            let mut sheet = Sheet::new(&sheet_name);

            // The range is anchored at its first occupied cell, not A1
            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            for (row_offset, row) in range.rows().enumerate() {
                for (col_offset, cell) in row.iter().enumerate() {
                    if let Some(value) = convert_cell(cell) {
                        let row_1 = start_row + row_offset as u32 + 1;
                        let col_1 = start_col + col_offset as u32 + 1;
                        sheet.set_cell(row_1, col_1, value);
                    }
                }
            }

            let merges = source
                .worksheet_merge_cells(&sheet_name)
                .unwrap_or(Ok(Vec::new()))
                .unwrap_or_default();
            for dims in merges {
                let merged = MergedRange::new(
                    dims.start.0 + 1,
                    dims.start.1 + 1,
                    dims.end.0 + 1,
                    dims.end.1 + 1,
                );
                if !merged.is_single_cell() {
                    sheet.add_merged_range(merged);
                }
            }

            workbook.add_sheet(sheet);
        }

        Ok(workbook)
    }
}

/// Convert one calamine cell; empties and error cells vanish from the grid
fn convert_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            if s.is_empty() {
                None
            } else {
                Some(CellValue::Text(s.clone()))
            }
        }
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // Date serials survive as numbers; ISO strings stay textual
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => Some(CellValue::Text(s.clone())),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(_) => None,
    }
}
