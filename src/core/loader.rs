//! Question extraction once a sheet's layout is resolved

use crate::grid::Sheet;
use crate::types::{HeaderMap, QuestionRecord, SheetFormat};
use tracing::debug;

/// Pull every question out of a sheet according to its resolved layout.
///
/// Row-based sheets yield one record per non-blank question cell below the
/// header row. Column-based sheets yield one record per populated header
/// cell, all addressed to the shared answer row.
pub fn extract_questions(sheet: &Sheet, map: &HeaderMap) -> Vec<QuestionRecord> {
    let questions = match map {
        HeaderMap::RowBased(layout) => {
            let mut out = Vec::new();
            for row in layout.header_row + 1..=sheet.max_row() {
                let Some(question) = sheet.text(row, layout.question_col) else {
                    continue;
                };
                let guidance = layout
                    .guidance_col
                    .and_then(|col| sheet.text(row, col));
                out.push(QuestionRecord {
                    sheet_name: sheet.name().to_string(),
                    row_index: row,
                    column_index: 0,
                    question_text: question,
                    guidance_text: guidance,
                    format: SheetFormat::RowBased,
                });
            }
            out
        }
        HeaderMap::ColumnBased(layout) => {
            let mut out = Vec::new();
            for col in 1..=sheet.max_col() {
                let Some(question) = sheet.text(layout.header_row, col) else {
                    continue;
                };
                out.push(QuestionRecord {
                    sheet_name: sheet.name().to_string(),
                    row_index: layout.answer_row,
                    column_index: col,
                    question_text: question,
                    guidance_text: None,
                    format: SheetFormat::ColumnBased,
                });
            }
            out
        }
    };
    debug!(
        "sheet '{}': extracted {} question(s)",
        sheet.name(),
        questions.len()
    );
    questions
}
