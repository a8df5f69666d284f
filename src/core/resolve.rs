//! Layout resolution: find-or-create tracking columns and rows
//!
//! Resolution mutates the sheet (new header cells, new row labels) but is
//! idempotent: existing headers and labels are always searched first, so a
//! second pass over an already-fixed sheet changes nothing.

use crate::config::ScanConfig;
use crate::core::detect::{first_mostly_blank_row, header_index_at, RowHeaderLocation};
use crate::grid::Sheet;
use crate::types::{ColumnLayout, RowLayout};
use crate::vocab::{
    ANSWER_VARIANTS, CONFIDENCE_HEADER, CONFIDENCE_VARIANTS, DEFAULT_ANSWER_HEADER,
    GUIDANCE_VARIANTS, PROVENANCE_HEADER, PROVENANCE_VARIANTS,
};
use tracing::debug;

/// Find a column whose header matches one of `variants`, or create one.
///
/// Creation appends after the true rightmost populated column within the
/// scanned header rows. Counting detected headers instead would place the
/// new header inside trailing merged or decorative cells and silently
/// corrupt the layout. Returns the column and whether the sheet changed.
fn find_or_create_column(
    sheet: &mut Sheet,
    header_row: u32,
    variants: &[&str],
    default_name: &str,
    config: &ScanConfig,
) -> (u32, bool) {
    let headers = header_index_at(sheet, header_row);
    if let Some(hit) = headers.find(variants) {
        return (hit.column, false);
    }

    let column = sheet.rightmost_populated_col(config.max_scan_rows) + 1;
    // A decorative merge may still cover the landing cell
    sheet.unmerge_covering(header_row, column);
    sheet.set_text(header_row, column, default_name);
    debug!(
        "sheet '{}': created '{}' header at column {}",
        sheet.name(),
        default_name,
        column
    );
    (column, true)
}

/// Resolve the full row-based layout for a located header row, creating
/// the answer/confidence/provenance columns when absent. Guidance is
/// find-only. Returns the layout and whether the sheet changed.
pub fn resolve_row_layout(
    sheet: &mut Sheet,
    location: &RowHeaderLocation,
    config: &ScanConfig,
) -> (RowLayout, bool) {
    let headers = header_index_at(sheet, location.header_row);
    let guidance_col = headers.find(GUIDANCE_VARIANTS).map(|hit| hit.column);

    let (answer_col, answer_created) = find_or_create_column(
        sheet,
        location.header_row,
        ANSWER_VARIANTS,
        DEFAULT_ANSWER_HEADER,
        config,
    );
    let (confidence_col, confidence_created) = find_or_create_column(
        sheet,
        location.header_row,
        CONFIDENCE_VARIANTS,
        CONFIDENCE_HEADER,
        config,
    );
    let (provenance_col, provenance_created) = find_or_create_column(
        sheet,
        location.header_row,
        PROVENANCE_VARIANTS,
        PROVENANCE_HEADER,
        config,
    );

    let layout = RowLayout {
        header_row: location.header_row,
        question_col: location
            .question_col
            .unwrap_or(config.fallback_question_col),
        answer_col,
        guidance_col,
        confidence_col,
        provenance_col,
        strategy: location.strategy,
        question_defaulted: location.question_col.is_none(),
    };
    (
        layout,
        answer_created || confidence_created || provenance_created,
    )
}

/// Find an existing tracking-row label in column 1 below the header
fn find_labeled_row(sheet: &Sheet, label: &str, below: u32, config: &ScanConfig) -> Option<u32> {
    let end = (below + config.blank_scan_rows).min(sheet.max_row());
    (below + 1..=end).find(|&row| sheet.text(row, 1).as_deref() == Some(label))
}

/// Resolve the column-based layout: the answer row is the first mostly
/// blank row under the header; confidence and provenance rows follow it
/// and get their labels written into column 1. Returns the layout and
/// whether the sheet changed.
pub fn resolve_column_layout(
    sheet: &mut Sheet,
    header_row: u32,
    config: &ScanConfig,
) -> (ColumnLayout, bool) {
    let answer_row = first_mostly_blank_row(sheet, header_row, config);

    let confidence_row = match find_labeled_row(sheet, CONFIDENCE_HEADER, header_row, config) {
        Some(row) => row,
        None => {
            let row = first_mostly_blank_row(sheet, answer_row, config);
            if row == answer_row {
                answer_row + 1
            } else {
                row
            }
        }
    };
    let provenance_row = match find_labeled_row(sheet, PROVENANCE_HEADER, header_row, config) {
        Some(row) => row,
        None => {
            let row = first_mostly_blank_row(sheet, confidence_row, config);
            if row == confidence_row {
                confidence_row + 1
            } else {
                row
            }
        }
    };

    let mut changed = false;
    if sheet.text(confidence_row, 1).as_deref() != Some(CONFIDENCE_HEADER) {
        sheet.unmerge_covering(confidence_row, 1);
        sheet.set_text(confidence_row, 1, CONFIDENCE_HEADER);
        changed = true;
    }
    if sheet.text(provenance_row, 1).as_deref() != Some(PROVENANCE_HEADER) {
        sheet.unmerge_covering(provenance_row, 1);
        sheet.set_text(provenance_row, 1, PROVENANCE_HEADER);
        changed = true;
    }
    if changed {
        debug!(
            "sheet '{}': tracking rows answer={} confidence={} provenance={}",
            sheet.name(),
            answer_row,
            confidence_row,
            provenance_row
        );
    }

    let layout = ColumnLayout {
        header_row,
        answer_row,
        confidence_row,
        provenance_row,
    };
    (layout, changed)
}
