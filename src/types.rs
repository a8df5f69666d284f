use serde::{Deserialize, Serialize};

//==============================================================================
// Sheet Formats
//==============================================================================

/// Questionnaire layout family for one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetFormat {
    /// One question per row; answer/guidance live in fixed columns
    #[serde(rename = "row-based")]
    RowBased,
    /// One question per column header; answers live on a fixed row
    #[serde(rename = "column-based")]
    ColumnBased,
}

impl SheetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetFormat::RowBased => "row-based",
            SheetFormat::ColumnBased => "column-based",
        }
    }
}

impl std::fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//==============================================================================
// Confidence Labels
//==============================================================================

/// Confidence attached to an answer.
///
/// Unrecognized labels deserialize as `Unknown` so a hand-edited updates
/// file cannot fail the whole batch over one bad cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::Unknown => "Unknown",
        }
    }

    /// Case-insensitive parse; anything unrecognized is `Unknown`
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            "low" => Confidence::Low,
            _ => Confidence::Unknown,
        }
    }

    /// Map a retrieval score to a label.
    ///
    /// A non-blank user-supplied answer is always High. Scores are on the
    /// reranker's ~0..4 scale: >= 3.2 High, >= 1.6 Medium, any hit Low,
    /// no hit Unknown.
    pub fn from_score(best_score: Option<f64>, user_answer: Option<&str>) -> Self {
        if let Some(user) = user_answer {
            if !user.trim().is_empty() {
                return Confidence::High;
            }
        }
        match best_score {
            Some(score) if score >= 3.2 => Confidence::High,
            Some(score) if score >= 1.6 => Confidence::Medium,
            Some(_) => Confidence::Low,
            None => Confidence::Unknown,
        }
    }
}

impl From<String> for Confidence {
    fn from(label: String) -> Self {
        Confidence::parse(&label)
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Unknown
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//==============================================================================
// Header Maps
//==============================================================================

/// Which detection path produced a row-based header location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectStrategy {
    /// A row held both a Guidance-variant and an Answer-variant header
    GuidanceAndAnswer,
    /// A row held an Answer-variant header plus more than two headers
    AnswerRow,
    /// A row held a Question-variant header and nothing stronger matched
    QuestionOnly,
    /// Nothing matched; the configured default coordinates were used
    Fallback,
}

impl DetectStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectStrategy::GuidanceAndAnswer => "guidance-and-answer",
            DetectStrategy::AnswerRow => "answer-row",
            DetectStrategy::QuestionOnly => "question-only",
            DetectStrategy::Fallback => "fallback",
        }
    }
}

/// Resolved field positions for a row-based sheet (all 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowLayout {
    pub header_row: u32,
    pub question_col: u32,
    pub answer_col: u32,
    pub guidance_col: Option<u32>,
    pub confidence_col: u32,
    pub provenance_col: u32,
    /// How the header row was found; `Fallback` means the default
    /// coordinates, which callers may want to treat with suspicion
    pub strategy: DetectStrategy,
    /// True when no Question-variant header existed and the configured
    /// default column was assumed
    pub question_defaulted: bool,
}

/// Resolved field positions for a column-based sheet (all 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLayout {
    pub header_row: u32,
    pub answer_row: u32,
    pub confidence_row: u32,
    pub provenance_row: u32,
}

/// Per-sheet field positions, computed once per load pass and immutable
/// for that pass. Questions and updates for the sheet all resolve through
/// the same map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format")]
pub enum HeaderMap {
    #[serde(rename = "row-based")]
    RowBased(RowLayout),
    #[serde(rename = "column-based")]
    ColumnBased(ColumnLayout),
}

impl HeaderMap {
    pub fn format(&self) -> SheetFormat {
        match self {
            HeaderMap::RowBased(_) => SheetFormat::RowBased,
            HeaderMap::ColumnBased(_) => SheetFormat::ColumnBased,
        }
    }

    pub fn header_row(&self) -> u32 {
        match self {
            HeaderMap::RowBased(layout) => layout.header_row,
            HeaderMap::ColumnBased(layout) => layout.header_row,
        }
    }
}

//==============================================================================
// Question Records
//==============================================================================

/// One extracted question.
///
/// Field names serialize in the PascalCase shape the surrounding tooling
/// exchanges ("SheetName", "RowIndex", "Question", ...). `column_index` is
/// 0 for row-based records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuestionRecord {
    pub sheet_name: String,
    pub row_index: u32,
    #[serde(default)]
    pub column_index: u32,
    #[serde(rename = "Question")]
    pub question_text: String,
    #[serde(rename = "Guidance", skip_serializing_if = "Option::is_none", default)]
    pub guidance_text: Option<String>,
    pub format: SheetFormat,
}

impl QuestionRecord {
    /// Identity key within one load pass
    pub fn key(&self) -> (&str, u32, u32) {
        (self.sheet_name.as_str(), self.row_index, self.column_index)
    }
}

//==============================================================================
// Answer Updates
//==============================================================================

/// One answer to write back.
///
/// `column_index` is optional in the inbound contract (0 when absent);
/// column-based updates without it are resolved by question text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnswerUpdate {
    pub sheet_name: String,
    pub row_index: u32,
    #[serde(default)]
    pub column_index: u32,
    #[serde(rename = "Question", skip_serializing_if = "Option::is_none", default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub provenance: String,
}

impl AnswerUpdate {
    /// Upsert key: last write wins per (sheet, row, col)
    pub fn key(&self) -> (&str, u32, u32) {
        (self.sheet_name.as_str(), self.row_index, self.column_index)
    }
}

//==============================================================================
// Load Reports
//==============================================================================

/// Why a sheet contributed nothing to a load pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Only the fallback strategy fired and it yielded zero questions
    NoHeader,
    /// The requested sheet name is not in the workbook
    NotInWorkbook,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoHeader => write!(f, "no recognizable header"),
            SkipReason::NotInWorkbook => write!(f, "not in workbook"),
        }
    }
}

/// Outcome of loading one sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SheetOutcome {
    Loaded {
        sheet: String,
        format: SheetFormat,
        header_row: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        strategy: Option<DetectStrategy>,
        questions: usize,
    },
    Skipped {
        sheet: String,
        reason: SkipReason,
    },
}

impl SheetOutcome {
    pub fn sheet(&self) -> &str {
        match self {
            SheetOutcome::Loaded { sheet, .. } => sheet,
            SheetOutcome::Skipped { sheet, .. } => sheet,
        }
    }
}

/// Typed result of a load pass: one outcome per requested sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub outcomes: Vec<SheetOutcome>,
}

impl LoadReport {
    pub fn loaded_sheets(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SheetOutcome::Loaded { .. }))
            .count()
    }

    pub fn total_questions(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                SheetOutcome::Loaded { questions, .. } => *questions,
                SheetOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> Vec<(&str, SkipReason)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                SheetOutcome::Skipped { sheet, reason } => Some((sheet.as_str(), *reason)),
                _ => None,
            })
            .collect()
    }

    pub fn has_skips(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, SheetOutcome::Skipped { .. }))
    }

    pub fn summary(&self) -> String {
        format!(
            "Loaded {} questions from {} sheet(s)",
            self.total_questions(),
            self.loaded_sheets()
        )
    }
}

//==============================================================================
// Persist Reports
//==============================================================================

/// Why a single update could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateSkipReason {
    /// Sheet name is not in the workbook
    SheetNotFound,
    /// Sheet exists but was not part of the load pass, so no HeaderMap
    SheetNotLoaded,
    /// Row 0, or a row at/above the header row
    InvalidRow,
    /// No column index and the question text matched no loaded record
    UnresolvedColumn,
    /// The question text matched more than one loaded record
    AmbiguousQuestion,
}

impl std::fmt::Display for UpdateSkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateSkipReason::SheetNotFound => write!(f, "sheet not found"),
            UpdateSkipReason::SheetNotLoaded => write!(f, "sheet not loaded"),
            UpdateSkipReason::InvalidRow => write!(f, "invalid row index"),
            UpdateSkipReason::UnresolvedColumn => write!(f, "unresolvable column"),
            UpdateSkipReason::AmbiguousQuestion => write!(f, "ambiguous question text"),
        }
    }
}

/// One update that was skipped, with enough identity to report it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUpdate {
    pub sheet_name: String,
    pub row_index: u32,
    pub column_index: u32,
    /// Present when the update was identified by question text rather
    /// than coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    pub reason: UpdateSkipReason,
}

/// Typed result of applying a batch of updates.
///
/// Duplicate updates for one target cell count once; callers distinguish
/// full from partial application here instead of re-deriving it from a
/// printed count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersistReport {
    pub applied: usize,
    pub skipped: Vec<SkippedUpdate>,
}

impl PersistReport {
    pub fn fully_applied(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn requested(&self) -> usize {
        self.applied + self.skipped.len()
    }

    pub fn summary(&self) -> String {
        format!("Saved {} answers", self.applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_confidence_from_score_thresholds() {
        assert_eq!(Confidence::from_score(Some(3.2), None), Confidence::High);
        assert_eq!(Confidence::from_score(Some(3.19), None), Confidence::Medium);
        assert_eq!(Confidence::from_score(Some(1.6), None), Confidence::Medium);
        assert_eq!(Confidence::from_score(Some(0.4), None), Confidence::Low);
        assert_eq!(Confidence::from_score(None, None), Confidence::Unknown);
    }

    #[test]
    fn test_confidence_user_answer_wins() {
        assert_eq!(
            Confidence::from_score(None, Some("10.0.0.4")),
            Confidence::High
        );
        // Blank user answers do not count
        assert_eq!(Confidence::from_score(None, Some("   ")), Confidence::Unknown);
    }

    #[test]
    fn test_confidence_parse_is_loose() {
        assert_eq!(Confidence::parse("high"), Confidence::High);
        assert_eq!(Confidence::parse(" MEDIUM "), Confidence::Medium);
        assert_eq!(Confidence::parse("certain"), Confidence::Unknown);
    }

    #[test]
    fn test_question_record_contract_field_names() {
        let record = QuestionRecord {
            sheet_name: "Assessment".to_string(),
            row_index: 4,
            column_index: 0,
            question_text: "What is the VM hostname?".to_string(),
            guidance_text: Some("e.g. prod-web-01".to_string()),
            format: SheetFormat::RowBased,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["SheetName"], "Assessment");
        assert_eq!(json["RowIndex"], 4);
        assert_eq!(json["Question"], "What is the VM hostname?");
        assert_eq!(json["Guidance"], "e.g. prod-web-01");
        assert_eq!(json["Format"], "row-based");
    }

    #[test]
    fn test_answer_update_accepts_minimal_json() {
        let json = r#"{"SheetName":"Sheet1","RowIndex":5,"Answer":"AKS","Confidence":"high"}"#;
        let update: AnswerUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.column_index, 0);
        assert_eq!(update.confidence, Confidence::High);
        assert_eq!(update.provenance, "");
    }

    #[test]
    fn test_unknown_confidence_label_does_not_fail_parse() {
        let json = r#"{"SheetName":"Sheet1","RowIndex":5,"Answer":"x","Confidence":"certain"}"#;
        let update: AnswerUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.confidence, Confidence::Unknown);
    }

    #[test]
    fn test_load_report_summary() {
        let report = LoadReport {
            outcomes: vec![
                SheetOutcome::Loaded {
                    sheet: "A".to_string(),
                    format: SheetFormat::RowBased,
                    header_row: 3,
                    strategy: Some(DetectStrategy::GuidanceAndAnswer),
                    questions: 7,
                },
                SheetOutcome::Skipped {
                    sheet: "Notes".to_string(),
                    reason: SkipReason::NoHeader,
                },
            ],
        };
        assert_eq!(report.summary(), "Loaded 7 questions from 1 sheet(s)");
        assert!(report.has_skips());
        assert_eq!(report.skipped(), vec![("Notes", SkipReason::NoHeader)]);
    }

    #[test]
    fn test_persist_report_accounting() {
        let report = PersistReport {
            applied: 3,
            skipped: vec![SkippedUpdate {
                sheet_name: "Sheet1".to_string(),
                row_index: 0,
                column_index: 0,
                question_text: None,
                reason: UpdateSkipReason::InvalidRow,
            }],
        };
        assert_eq!(report.requested(), 4);
        assert!(!report.fully_applied());
        assert_eq!(report.summary(), "Saved 3 answers");
    }
}
