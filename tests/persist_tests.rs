//! Write-back roundtrip tests
//!
//! Every test opens a real fixture through a Session, persists updates,
//! then re-reads the clean copy from disk to check what actually landed.

use intake::excel::{WorkbookReader, WorkbookWriter};
use intake::grid::{MergedRange, Sheet, Workbook};
use intake::session::{LoadOptions, Session};
use intake::types::{AnswerUpdate, Confidence, UpdateSkipReason};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

fn security_sheet() -> Sheet {
    let mut sheet = Sheet::new("Security");
    sheet.set_text(2, 2, "Question");
    sheet.set_text(2, 3, "Guidance");
    sheet.set_text(2, 4, "Answer");
    sheet.set_text(3, 2, "Do you encrypt data at rest?");
    sheet.set_text(4, 2, "Do you rotate keys?");
    sheet.set_text(5, 2, "Is MFA enforced for admin access?");
    sheet
}

fn inventory_sheet() -> Sheet {
    let mut sheet = Sheet::new("Inventory");
    let headers = [
        "VM Hostname",
        "Domain",
        "IP Address",
        "vCPU",
        "RAM",
        "Operating System",
    ];
    for (i, header) in headers.iter().enumerate() {
        sheet.set_text(1, i as u32 + 1, *header);
    }
    sheet
}

fn write_fixture(dir: &Path, name: &str, sheets: Vec<Sheet>) -> PathBuf {
    let mut workbook = Workbook::new();
    for sheet in sheets {
        workbook.add_sheet(sheet);
    }
    let path = dir.join(name);
    WorkbookWriter::new(&path).write(&workbook).unwrap();
    path
}

fn options(dir: &Path) -> LoadOptions {
    LoadOptions {
        work_dir: Some(dir.to_path_buf()),
        ..Default::default()
    }
}

fn update(sheet: &str, row: u32, answer: &str) -> AnswerUpdate {
    AnswerUpdate {
        sheet_name: sheet.to_string(),
        row_index: row,
        column_index: 0,
        question_text: None,
        answer: answer.to_string(),
        confidence: Confidence::High,
        provenance: "policy-kb".to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ROW-BASED ROUNDTRIPS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_row_based_answers_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "security.xlsx", vec![security_sheet()]);
    let mut session = Session::open(&path, &options(dir.path())).unwrap();

    let updates = vec![
        update("Security", 3, "Yes, AES-256-GCM"),
        update("Security", 4, "Quarterly via KMS"),
    ];
    let report = session.persist(&updates).unwrap();
    assert_eq!(report.applied, 2);
    assert!(report.fully_applied());

    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    let sheet = reread.sheet("Security").unwrap();
    assert_eq!(sheet.text(3, 4).as_deref(), Some("Yes, AES-256-GCM"));
    assert_eq!(sheet.text(3, 5).as_deref(), Some("High"));
    assert_eq!(sheet.text(3, 6).as_deref(), Some("policy-kb"));
    assert_eq!(sheet.text(4, 4).as_deref(), Some("Quarterly via KMS"));
    // The unanswered question keeps its row untouched
    assert_eq!(sheet.text(5, 4), None);
    assert_eq!(sheet.text(5, 5), None);
}

#[test]
fn test_updates_parse_from_exchange_json() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "security.xlsx", vec![security_sheet()]);
    let mut session = Session::open(&path, &options(dir.path())).unwrap();

    // Minimal inbound shape: no ColumnIndex, no Provenance, loose labels
    let json = r#"[
        {"SheetName":"Security","RowIndex":3,"Answer":"Yes","Confidence":"low"},
        {"SheetName":"Security","RowIndex":4,"Answer":"Quarterly","Confidence":"HIGH","Provenance":"kms-runbook"}
    ]"#;
    let updates: Vec<AnswerUpdate> = serde_json::from_str(json).unwrap();
    let report = session.persist(&updates).unwrap();
    assert_eq!(report.applied, 2);

    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    let sheet = reread.sheet("Security").unwrap();
    assert_eq!(sheet.text(3, 5).as_deref(), Some("Low"));
    assert_eq!(sheet.text(3, 6), None);
    assert_eq!(sheet.text(4, 5).as_deref(), Some("High"));
    assert_eq!(sheet.text(4, 6).as_deref(), Some("kms-runbook"));
}

#[test]
fn test_bad_rows_are_reported_and_the_rest_applies() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "security.xlsx", vec![security_sheet()]);
    let mut session = Session::open(&path, &options(dir.path())).unwrap();

    let updates = vec![
        update("Security", 0, "nowhere"),
        update("Security", 2, "onto the header"),
        update("Security", 3, "first pass"),
        update("Security", 3, "second pass"),
    ];
    let report = session.persist(&updates).unwrap();
    // The two writes to row 3 hit one cell and count once
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|s| s.reason == UpdateSkipReason::InvalidRow));
    assert_eq!(report.requested(), 3);
    assert!(!report.fully_applied());

    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    let sheet = reread.sheet("Security").unwrap();
    // Last write wins, header row survives
    assert_eq!(sheet.text(3, 4).as_deref(), Some("second pass"));
    assert_eq!(sheet.text(2, 4).as_deref(), Some("Answer"));
}

#[test]
fn test_merged_answer_band_is_split_on_write() {
    let mut sheet = Sheet::new("Contact");
    sheet.set_text(1, 1, "Question");
    sheet.set_text(1, 2, "Response");
    sheet.set_text(2, 1, "Primary contact email?");
    // Template decoration: the whole answer area of row 2 is one merge
    sheet.add_merged_range(MergedRange::new(2, 2, 2, 4));

    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "contact.xlsx", vec![sheet]);
    let mut session = Session::open(&path, &options(dir.path())).unwrap();

    let report = session
        .persist(&[update("Contact", 2, "ops@acme.example")])
        .unwrap();
    assert_eq!(report.applied, 1);

    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    let sheet = reread.sheet("Contact").unwrap();
    assert_eq!(sheet.text(2, 2).as_deref(), Some("ops@acme.example"));
    // The band was split, so confidence and provenance kept their own
    // columns instead of collapsing onto the merge anchor
    assert_eq!(sheet.text(2, 3).as_deref(), Some("High"));
    assert_eq!(sheet.text(2, 4).as_deref(), Some("policy-kb"));
    assert!(sheet.merged_ranges().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// COLUMN-BASED ROUNDTRIPS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_column_based_updates_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "inventory.xlsx", vec![inventory_sheet()]);
    let mut session = Session::open(&path, &options(dir.path())).unwrap();

    let by_text = AnswerUpdate {
        sheet_name: "Inventory".to_string(),
        row_index: 2,
        column_index: 0,
        question_text: Some("IP Address".to_string()),
        answer: "10.0.40.11".to_string(),
        confidence: Confidence::Medium,
        provenance: "netbox".to_string(),
    };
    let by_index = AnswerUpdate {
        sheet_name: "Inventory".to_string(),
        row_index: 2,
        column_index: 5,
        question_text: None,
        answer: "64 GB".to_string(),
        confidence: Confidence::High,
        provenance: String::new(),
    };
    let report = session.persist(&[by_text, by_index]).unwrap();
    assert_eq!(report.applied, 2);

    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    let sheet = reread.sheet("Inventory").unwrap();
    assert_eq!(sheet.text(2, 3).as_deref(), Some("10.0.40.11"));
    assert_eq!(sheet.text(3, 3).as_deref(), Some("Medium"));
    assert_eq!(sheet.text(4, 3).as_deref(), Some("netbox"));
    assert_eq!(sheet.text(2, 5).as_deref(), Some("64 GB"));
    assert_eq!(sheet.text(3, 5).as_deref(), Some("High"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CROSS-SHEET BATCHES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_one_batch_spans_both_formats() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        dir.path(),
        "mixed.xlsx",
        vec![security_sheet(), inventory_sheet()],
    );
    let mut session = Session::open(&path, &options(dir.path())).unwrap();

    let row_update = update("Security", 3, "Yes");
    let col_update = AnswerUpdate {
        sheet_name: "Inventory".to_string(),
        row_index: 2,
        column_index: 0,
        question_text: Some("VM Hostname".to_string()),
        answer: "prod-web-01".to_string(),
        confidence: Confidence::High,
        provenance: "cmdb".to_string(),
    };
    let report = session.persist(&[row_update, col_update]).unwrap();
    assert_eq!(report.applied, 2);

    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    assert_eq!(
        reread.sheet("Security").unwrap().text(3, 4).as_deref(),
        Some("Yes")
    );
    assert_eq!(
        reread.sheet("Inventory").unwrap().text(2, 1).as_deref(),
        Some("prod-web-01")
    );
}

#[test]
fn test_update_for_an_unloaded_sheet_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        dir.path(),
        "mixed.xlsx",
        vec![security_sheet(), inventory_sheet()],
    );
    let mut opts = options(dir.path());
    opts.sheets = vec!["Security".to_string()];
    let mut session = Session::open(&path, &opts).unwrap();

    let updates = vec![
        update("Security", 3, "Yes"),
        update("Inventory", 2, "ignored"),
    ];
    let report = session.persist(&updates).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped[0].reason, UpdateSkipReason::SheetNotLoaded);

    // The unloaded sheet kept its cells
    let reread = WorkbookReader::new(session.workbook_path()).read().unwrap();
    assert_eq!(reread.sheet("Inventory").unwrap().text(2, 1), None);
}
