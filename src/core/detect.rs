//! Header and format detection heuristics
//!
//! Everything here is a read-only scan over one sheet. The strategies run
//! in strict priority order and the winning one is reported, so a caller
//! can tell a genuine header hit from the empirical fallback coordinates.

use crate::config::ScanConfig;
use crate::grid::Sheet;
use crate::types::{DetectStrategy, SheetFormat};
use crate::vocab::{
    HeaderIndex, ANSWER_VARIANTS, GUIDANCE_VARIANTS, INVENTORY_HINTS, INVENTORY_TERMS,
    QUESTION_VARIANTS,
};
use tracing::debug;

/// Where a row-based header scan landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHeaderLocation {
    pub header_row: u32,
    /// `None` when no Question-variant header was present and the
    /// configured default column applies
    pub question_col: Option<u32>,
    pub strategy: DetectStrategy,
}

/// Build the header-text index for one row
pub fn header_index_at(sheet: &Sheet, row: u32) -> HeaderIndex {
    let mut index = HeaderIndex::new();
    for col in 1..=sheet.max_col() {
        if let Some(text) = sheet.text(row, col) {
            index.push(&text, col);
        }
    }
    index
}

/// Decide whether a sheet is a row-based questionnaire or a column-based
/// inventory sheet.
///
/// A Question-variant header anywhere in the leading rows wins; otherwise
/// enough inventory terms among the early header cells mark the sheet
/// column-based; otherwise row-based.
pub fn detect_format(sheet: &Sheet, config: &ScanConfig) -> SheetFormat {
    let question_limit = config.max_scan_rows.min(sheet.max_row());
    for row in 1..=question_limit {
        let headers = header_index_at(sheet, row);
        if !headers.is_empty() && headers.find(QUESTION_VARIANTS).is_some() {
            return SheetFormat::RowBased;
        }
    }

    let inventory_limit = config.format_scan_rows.min(sheet.max_row());
    for row in 1..=inventory_limit {
        let headers = header_index_at(sheet, row);
        if headers.is_empty() {
            continue;
        }
        let texts: Vec<String> = headers.iter().map(|(t, _)| t.to_lowercase()).collect();
        let matches = INVENTORY_TERMS
            .iter()
            .filter(|term| texts.iter().any(|t| t.contains(*term)))
            .count();
        if matches >= config.inventory_min_matches {
            debug!(
                "sheet '{}': {} inventory terms on row {}, column-based",
                sheet.name(),
                matches,
                row
            );
            return SheetFormat::ColumnBased;
        }
    }

    SheetFormat::RowBased
}

/// Locate the header row of a row-based sheet.
///
/// Strategies in priority order, each scanning the leading rows:
/// 1. a row holding both a Guidance-variant and an Answer-variant header;
/// 2. a row holding an Answer-variant header and more than two headers;
/// 3. a row holding any Question-variant header;
/// 4. the configured fallback coordinates.
pub fn locate_row_header(sheet: &Sheet, config: &ScanConfig) -> RowHeaderLocation {
    let limit = config.max_scan_rows.min(sheet.max_row());

    for row in 1..=limit {
        let headers = header_index_at(sheet, row);
        if headers.is_empty() {
            continue;
        }
        if headers.find(GUIDANCE_VARIANTS).is_some() && headers.find(ANSWER_VARIANTS).is_some() {
            let question_col = headers.find(QUESTION_VARIANTS).map(|hit| hit.column);
            debug!("sheet '{}': header row {} via guidance+answer", sheet.name(), row);
            return RowHeaderLocation {
                header_row: row,
                question_col,
                strategy: DetectStrategy::GuidanceAndAnswer,
            };
        }
    }

    for row in 1..=limit {
        let headers = header_index_at(sheet, row);
        if headers.len() > 2 && headers.find(ANSWER_VARIANTS).is_some() {
            let question_col = headers.find(QUESTION_VARIANTS).map(|hit| hit.column);
            debug!("sheet '{}': header row {} via answer-variant", sheet.name(), row);
            return RowHeaderLocation {
                header_row: row,
                question_col,
                strategy: DetectStrategy::AnswerRow,
            };
        }
    }

    for row in 1..=limit {
        let headers = header_index_at(sheet, row);
        if let Some(hit) = headers.find(QUESTION_VARIANTS) {
            debug!("sheet '{}': header row {} via question-variant", sheet.name(), row);
            return RowHeaderLocation {
                header_row: row,
                question_col: Some(hit.column),
                strategy: DetectStrategy::QuestionOnly,
            };
        }
    }

    debug!(
        "sheet '{}': no header strategy matched, falling back to row {}",
        sheet.name(),
        config.fallback_header_row
    );
    RowHeaderLocation {
        header_row: config.fallback_header_row,
        question_col: None,
        strategy: DetectStrategy::Fallback,
    }
}

/// Pick the header row of a column-based sheet: the first leading row with
/// enough populated cells and enough short inventory hints among them
pub fn locate_column_header_row(sheet: &Sheet, config: &ScanConfig) -> u32 {
    let limit = config.max_scan_rows.min(sheet.max_row());
    let probe_cols = config.blank_probe_cols.min(sheet.max_col());

    for row in 1..=limit {
        let mut texts = Vec::new();
        for col in 1..=probe_cols {
            if let Some(text) = sheet.text(row, col) {
                texts.push(text.to_lowercase());
            }
        }
        if texts.len() < config.hint_min_populated {
            continue;
        }
        let matches = INVENTORY_HINTS
            .iter()
            .filter(|hint| texts.iter().any(|t| t.contains(*hint)))
            .count();
        if matches >= config.hint_min_matches {
            return row;
        }
    }

    config.fallback_header_row
}

/// First mostly-empty row strictly below `reference`.
///
/// A row counts as blank when fewer than `blank_ratio` of its first
/// `blank_probe_cols` columns (capped by the sheet width) are populated.
/// Defaults to the row right below the reference when nothing in the
/// scanned window qualifies.
pub fn first_mostly_blank_row(sheet: &Sheet, reference: u32, config: &ScanConfig) -> u32 {
    let start = reference + 1;
    let end = (reference + config.blank_scan_rows).min(sheet.max_row().max(start));
    let probe_cols = config.blank_probe_cols.min(sheet.max_col());

    if probe_cols > 0 {
        for row in start..=end {
            let populated = (1..=probe_cols)
                .filter(|&col| sheet.is_populated(row, col))
                .count();
            if (populated as f64) < (probe_cols as f64) * config.blank_ratio {
                return row;
            }
        }
    }

    reference + 1
}
