//! Writing answer updates back onto the grid
//!
//! Application is fail-open: a bad update is recorded and skipped, never
//! allowed to abort the rest of the batch. The caller gets a typed
//! [`PersistReport`] instead of a log line to parse.

use std::collections::{BTreeMap, BTreeSet};

use crate::grid::{CellValue, Sheet, Workbook};
use crate::types::{
    AnswerUpdate, HeaderMap, PersistReport, QuestionRecord, RowLayout, SheetFormat, SkippedUpdate,
    UpdateSkipReason,
};
use crate::vocab::{CONFIDENCE_HEADER, PROVENANCE_HEADER};
use tracing::warn;

/// Apply a batch of updates against resolved layouts.
///
/// Duplicates targeting one resolved answer cell count once in `applied`
/// (last write wins). A write into a merged region splits the region and
/// lands on its former top-left cell, so the companion confidence and
/// provenance writes stay in their own columns.
pub fn apply_updates(
    workbook: &mut Workbook,
    layouts: &BTreeMap<String, HeaderMap>,
    questions: &[QuestionRecord],
    updates: &[AnswerUpdate],
) -> PersistReport {
    let mut written: BTreeSet<(String, u32, u32)> = BTreeSet::new();
    let mut skipped: Vec<SkippedUpdate> = Vec::new();

    for update in updates {
        let map = layouts.get(&update.sheet_name);
        let Some(sheet) = workbook.sheet_mut(&update.sheet_name) else {
            push_skip(&mut skipped, update, UpdateSkipReason::SheetNotFound);
            continue;
        };
        let Some(map) = map else {
            push_skip(&mut skipped, update, UpdateSkipReason::SheetNotLoaded);
            continue;
        };

        match map {
            HeaderMap::RowBased(layout) => {
                if update.row_index == 0 || update.row_index <= layout.header_row {
                    push_skip(&mut skipped, update, UpdateSkipReason::InvalidRow);
                    continue;
                }
                ensure_tracking_headers(sheet, layout);
                let target = sheet.write_merge_safe(
                    update.row_index,
                    layout.answer_col,
                    CellValue::Text(update.answer.clone()),
                );
                sheet.write_merge_safe(
                    update.row_index,
                    layout.confidence_col,
                    CellValue::Text(update.confidence.as_str().to_string()),
                );
                if !update.provenance.trim().is_empty() {
                    sheet.write_merge_safe(
                        update.row_index,
                        layout.provenance_col,
                        CellValue::Text(update.provenance.clone()),
                    );
                }
                written.insert((update.sheet_name.clone(), target.0, target.1));
            }
            HeaderMap::ColumnBased(layout) => {
                let column = match resolve_column(update, questions) {
                    Ok(column) => column,
                    Err(reason) => {
                        push_skip(&mut skipped, update, reason);
                        continue;
                    }
                };
                let target = sheet.write_merge_safe(
                    layout.answer_row,
                    column,
                    CellValue::Text(update.answer.clone()),
                );
                sheet.write_merge_safe(
                    layout.confidence_row,
                    column,
                    CellValue::Text(update.confidence.as_str().to_string()),
                );
                if !update.provenance.trim().is_empty() {
                    sheet.write_merge_safe(
                        layout.provenance_row,
                        column,
                        CellValue::Text(update.provenance.clone()),
                    );
                }
                written.insert((update.sheet_name.clone(), target.0, target.1));
            }
        }
    }

    PersistReport {
        applied: written.len(),
        skipped,
    }
}

/// Map a column-based update to its column: explicit index wins, then an
/// exact trimmed match against the loaded question texts for the sheet
fn resolve_column(
    update: &AnswerUpdate,
    questions: &[QuestionRecord],
) -> Result<u32, UpdateSkipReason> {
    if update.column_index > 0 {
        return Ok(update.column_index);
    }
    let Some(text) = update
        .question_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    else {
        return Err(UpdateSkipReason::UnresolvedColumn);
    };

    let mut hits = questions.iter().filter(|q| {
        q.sheet_name == update.sheet_name
            && q.format == SheetFormat::ColumnBased
            && q.question_text.trim() == text
    });
    match (hits.next(), hits.next()) {
        (Some(hit), None) => Ok(hit.column_index),
        (Some(_), Some(_)) => Err(UpdateSkipReason::AmbiguousQuestion),
        (None, _) => Err(UpdateSkipReason::UnresolvedColumn),
    }
}

/// Layouts loaded from an external header map may point at tracking
/// columns whose header cells were never written
fn ensure_tracking_headers(sheet: &mut Sheet, layout: &RowLayout) {
    if sheet.text(layout.header_row, layout.confidence_col).is_none() {
        sheet.set_text(layout.header_row, layout.confidence_col, CONFIDENCE_HEADER);
    }
    if sheet.text(layout.header_row, layout.provenance_col).is_none() {
        sheet.set_text(layout.header_row, layout.provenance_col, PROVENANCE_HEADER);
    }
}

fn push_skip(skipped: &mut Vec<SkippedUpdate>, update: &AnswerUpdate, reason: UpdateSkipReason) {
    warn!(
        "sheet '{}': skipping update at row {} col {}: {}",
        update.sheet_name, update.row_index, update.column_index, reason
    );
    let entry = SkippedUpdate {
        sheet_name: update.sheet_name.clone(),
        row_index: update.row_index,
        column_index: update.column_index,
        question_text: update.question_text.clone(),
        reason,
    };
    if !skipped.contains(&entry) {
        skipped.push(entry);
    }
}
