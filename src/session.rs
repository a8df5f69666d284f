//! Load session: one workbook, its resolved layouts, and the questions
//!
//! A session owns everything a load pass produced. There is no shared
//! mutable state behind it; two sessions over the same file are fully
//! independent, and dropping a session forgets everything except the
//! clean working copy on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::core::{
    apply_updates, detect_format, extract_questions, locate_column_header_row, locate_row_header,
    resolve_column_layout, resolve_row_layout,
};
use crate::error::{IntakeError, IntakeResult};
use crate::excel::{materialize_clean_copy, WorkbookWriter};
use crate::grid::Workbook;
use crate::types::{
    AnswerUpdate, DetectStrategy, HeaderMap, LoadReport, PersistReport, QuestionRecord,
    SheetFormat, SheetOutcome, SkipReason,
};

/// Options for opening a session
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Sheets to load, in order; empty means every sheet in the workbook
    pub sheets: Vec<String>,
    /// Where the clean working copy goes; defaults to the system temp dir
    pub work_dir: Option<PathBuf>,
    pub scan: ScanConfig,
}

/// An opened workbook with resolved layouts and extracted questions.
///
/// Opening is idempotent: re-opening a workbook whose tracking columns
/// already exist finds them instead of creating more, and only writes the
/// working copy when resolution actually changed something.
#[derive(Debug)]
pub struct Session {
    workbook: Workbook,
    workbook_path: PathBuf,
    layouts: BTreeMap<String, HeaderMap>,
    questions: Vec<QuestionRecord>,
    report: LoadReport,
    dirty: bool,
}

impl Session {
    /// Open a workbook: materialize the clean copy, detect and resolve
    /// every selected sheet, extract questions, and save the copy if any
    /// header mutation happened.
    pub fn open<P: AsRef<Path>>(path: P, options: &LoadOptions) -> IntakeResult<Self> {
        let (workbook_path, mut workbook) =
            materialize_clean_copy(path.as_ref(), options.work_dir.as_deref())?;

        let selected: Vec<String> = if options.sheets.is_empty() {
            workbook.sheet_names()
        } else {
            let requested = &options.sheets;
            if !requested.iter().any(|name| workbook.contains_sheet(name)) {
                return Err(IntakeError::NoMatchingSheets {
                    requested: requested.clone(),
                    available: workbook.sheet_names(),
                });
            }
            requested.clone()
        };
        debug!(
            "workbook '{}': loading {} sheet(s)",
            workbook_path.display(),
            selected.len()
        );

        let mut layouts = BTreeMap::new();
        let mut questions = Vec::new();
        let mut outcomes = Vec::new();
        let mut dirty = false;

        for name in &selected {
            let Some(sheet) = workbook.sheet_mut(name) else {
                outcomes.push(SheetOutcome::Skipped {
                    sheet: name.clone(),
                    reason: SkipReason::NotInWorkbook,
                });
                continue;
            };

            let format = detect_format(sheet, &options.scan);
            let map = match format {
                SheetFormat::RowBased => {
                    let location = locate_row_header(sheet, &options.scan);
                    if location.strategy == DetectStrategy::Fallback {
                        let fallback_col = options.scan.fallback_question_col;
                        let any_question = (location.header_row + 1..=sheet.max_row())
                            .any(|row| sheet.is_populated(row, fallback_col));
                        if !any_question {
                            outcomes.push(SheetOutcome::Skipped {
                                sheet: name.clone(),
                                reason: SkipReason::NoHeader,
                            });
                            continue;
                        }
                    }
                    let (layout, changed) = resolve_row_layout(sheet, &location, &options.scan);
                    dirty |= changed;
                    HeaderMap::RowBased(layout)
                }
                SheetFormat::ColumnBased => {
                    let header_row = locate_column_header_row(sheet, &options.scan);
                    let (layout, changed) = resolve_column_layout(sheet, header_row, &options.scan);
                    dirty |= changed;
                    HeaderMap::ColumnBased(layout)
                }
            };

            let extracted = extract_questions(sheet, &map);
            outcomes.push(SheetOutcome::Loaded {
                sheet: name.clone(),
                format: map.format(),
                header_row: map.header_row(),
                strategy: match &map {
                    HeaderMap::RowBased(layout) => Some(layout.strategy),
                    HeaderMap::ColumnBased(_) => None,
                },
                questions: extracted.len(),
            });
            layouts.insert(name.clone(), map);
            questions.extend(extracted);
        }

        let report = LoadReport { outcomes };
        info!("workbook '{}': {}", workbook_path.display(), report.summary());

        let mut session = Session {
            workbook,
            workbook_path,
            layouts,
            questions,
            report,
            dirty,
        };
        session.save()?;
        Ok(session)
    }

    /// Every question from the load pass, in sheet-then-position order
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Questions grouped by sheet, each list in load order. The 1-based
    /// position within a list is the number a reviewer sees for that sheet.
    pub fn question_map(&self) -> BTreeMap<&str, Vec<&QuestionRecord>> {
        let mut map: BTreeMap<&str, Vec<&QuestionRecord>> = BTreeMap::new();
        for question in &self.questions {
            map.entry(question.sheet_name.as_str())
                .or_default()
                .push(question);
        }
        map
    }

    /// Question by sheet and 1-based number within that sheet
    pub fn resolve_number(&self, sheet: &str, number: usize) -> Option<&QuestionRecord> {
        number.checked_sub(1).and_then(|n| {
            self.questions
                .iter()
                .filter(|q| q.sheet_name == sheet)
                .nth(n)
        })
    }

    pub fn layout(&self, sheet: &str) -> Option<&HeaderMap> {
        self.layouts.get(sheet)
    }

    pub fn layouts(&self) -> &BTreeMap<String, HeaderMap> {
        &self.layouts
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Path of the clean working copy all writes go to
    pub fn workbook_path(&self) -> &Path {
        &self.workbook_path
    }

    /// Apply updates in memory without saving
    pub fn apply(&mut self, updates: &[AnswerUpdate]) -> PersistReport {
        let report = apply_updates(&mut self.workbook, &self.layouts, &self.questions, updates);
        if report.applied > 0 {
            self.dirty = true;
        }
        report
    }

    /// Write the working copy back to disk if anything changed
    pub fn save(&mut self) -> IntakeResult<()> {
        if !self.dirty {
            return Ok(());
        }
        WorkbookWriter::new(&self.workbook_path).write(&self.workbook)?;
        self.dirty = false;
        Ok(())
    }

    /// Apply updates and save in one step
    pub fn persist(&mut self, updates: &[AnswerUpdate]) -> IntakeResult<PersistReport> {
        let report = self.apply(updates);
        self.save()?;
        Ok(report)
    }
}
