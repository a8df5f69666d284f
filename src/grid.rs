//! In-memory workbook grid
//!
//! Sheets are sparse maps of 1-based (row, column) to typed cell values,
//! plus the sheet's merged ranges. All header heuristics and answer writes
//! run against this model; disk I/O happens only at the excel boundary.

use serde::Serialize;

/// A single cell value; empty cells are absent from the grid
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Rendered text of the value, the way a header scan sees it
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// A rectangular merged cell group, 1-based inclusive bounds.
///
/// The grid stores the shared value only at the anchor (top-left); writes
/// to any covered cell must land there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergedRange {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl MergedRange {
    pub fn new(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        Self {
            min_row,
            min_col,
            max_row,
            max_col,
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.min_row && row <= self.max_row && col >= self.min_col && col <= self.max_col
    }

    /// Top-left coordinate, the only addressable member
    pub fn anchor(&self) -> (u32, u32) {
        (self.min_row, self.min_col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.min_row == self.max_row && self.min_col == self.max_col
    }
}

impl std::fmt::Display for MergedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letter(self.min_col),
            self.min_row,
            column_letter(self.max_col),
            self.max_row
        )
    }
}

/// Resolve where a write aimed at (row, col) must actually land.
///
/// Returns the anchor of the first merged range covering the cell, or the
/// cell itself when no range covers it. Pure: the unmerge side effect is a
/// separate step for the caller.
pub fn resolve_write_target(ranges: &[MergedRange], row: u32, col: u32) -> (u32, u32) {
    for range in ranges {
        if range.contains(row, col) {
            return range.anchor();
        }
    }
    (row, col)
}

/// Convert a 1-based column number to its letter name (1 -> A, 27 -> AA)
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut letters = String::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters
}

/// One worksheet: a sparse cell grid plus merged ranges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    cells: std::collections::BTreeMap<(u32, u32), CellValue>,
    merged: Vec<MergedRange>,
    max_row: u32,
    max_col: u32,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Highest row holding any cell (0 for an empty sheet)
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// Highest column holding any cell (0 for an empty sheet)
    pub fn max_col(&self) -> u32 {
        self.max_col
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Trimmed display text of a cell; `None` for absent or blank cells
    pub fn text(&self, row: u32, col: u32) -> Option<String> {
        let rendered = self.cell(row, col)?.display();
        let trimmed = rendered.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn is_populated(&self, row: u32, col: u32) -> bool {
        self.text(row, col).is_some()
    }

    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        debug_assert!(row >= 1 && col >= 1, "cell addresses are 1-based");
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self.cells.insert((row, col), value);
    }

    pub fn set_text(&mut self, row: u32, col: u32, text: impl Into<String>) {
        self.set_cell(row, col, CellValue::Text(text.into()));
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|(&(r, c), v)| (r, c, v))
    }

    pub fn merged_ranges(&self) -> &[MergedRange] {
        &self.merged
    }

    pub fn add_merged_range(&mut self, range: MergedRange) {
        self.max_row = self.max_row.max(range.max_row);
        self.max_col = self.max_col.max(range.max_col);
        self.merged.push(range);
    }

    /// Remove every merged range covering (row, col); returns the removed
    /// ranges so callers can log what was split
    pub fn unmerge_covering(&mut self, row: u32, col: u32) -> Vec<MergedRange> {
        let mut removed = Vec::new();
        self.merged.retain(|range| {
            if range.contains(row, col) {
                removed.push(*range);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Merge-safe write: any range covering the cell is split and the
    /// value lands at that range's former top-left. Splitting always
    /// happens, anchor writes included, so that follow-up writes to other
    /// cells of the former range stay in their own columns. Returns where
    /// the value was written.
    pub fn write_merge_safe(&mut self, row: u32, col: u32, value: CellValue) -> (u32, u32) {
        let (target_row, target_col) = resolve_write_target(&self.merged, row, col);
        self.unmerge_covering(row, col);
        self.set_cell(target_row, target_col, value);
        (target_row, target_col)
    }

    /// True rightmost populated column across the first `scan_rows` rows.
    ///
    /// This is what new tracking columns append after; counting detected
    /// headers instead would land new columns inside trailing merged or
    /// decorative cells.
    pub fn rightmost_populated_col(&self, scan_rows: u32) -> u32 {
        let limit = scan_rows.min(self.max_row);
        self.cells
            .iter()
            .filter(|(&(row, _), value)| row >= 1 && row <= limit && !value.display().trim().is_empty())
            .map(|(&(_, col), _)| col)
            .max()
            .unwrap_or(0)
    }
}

/// Ordered collection of named sheets; the ownership root the session
/// mutates in place and saves as a whole
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) -> &mut Sheet {
        self.sheets.push(sheet);
        self.sheets.last_mut().unwrap()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name() == name)
    }

    pub fn contains_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    /// First sheet in workbook order, the default load target
    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_write_target_identity_outside_merges() {
        let ranges = vec![MergedRange::new(1, 1, 2, 3)];
        assert_eq!(resolve_write_target(&ranges, 5, 2), (5, 2));
    }

    #[test]
    fn test_resolve_write_target_returns_anchor() {
        let ranges = vec![MergedRange::new(2, 2, 4, 5)];
        assert_eq!(resolve_write_target(&ranges, 3, 4), (2, 2));
        // The anchor itself resolves to itself
        assert_eq!(resolve_write_target(&ranges, 2, 2), (2, 2));
    }

    #[test]
    fn test_write_merge_safe_splits_and_lands_on_anchor() {
        let mut sheet = Sheet::new("S");
        sheet.add_merged_range(MergedRange::new(5, 2, 5, 6));
        let target = sheet.write_merge_safe(5, 4, CellValue::from("hello"));
        assert_eq!(target, (5, 2));
        assert_eq!(sheet.text(5, 2).as_deref(), Some("hello"));
        assert!(sheet.merged_ranges().is_empty());
        // Nothing ever lands on a non-anchor member
        assert_eq!(sheet.cell(5, 4), None);
    }

    #[test]
    fn test_write_merge_safe_splits_even_at_anchor() {
        let mut sheet = Sheet::new("S");
        sheet.add_merged_range(MergedRange::new(5, 2, 5, 6));
        let target = sheet.write_merge_safe(5, 2, CellValue::from("anchored"));
        assert_eq!(target, (5, 2));
        // Former members are ordinary cells again, so a later write to
        // column 4 stays in column 4
        assert!(sheet.merged_ranges().is_empty());
        sheet.write_merge_safe(5, 4, CellValue::from("sibling"));
        assert_eq!(sheet.text(5, 4).as_deref(), Some("sibling"));
        assert_eq!(sheet.text(5, 2).as_deref(), Some("anchored"));
    }

    #[test]
    fn test_unmerge_covering_removes_every_covering_range() {
        let mut sheet = Sheet::new("S");
        sheet.add_merged_range(MergedRange::new(1, 1, 3, 3));
        sheet.add_merged_range(MergedRange::new(2, 2, 2, 8));
        sheet.add_merged_range(MergedRange::new(7, 1, 9, 1));
        let removed = sheet.unmerge_covering(2, 2);
        assert_eq!(removed.len(), 2);
        assert_eq!(sheet.merged_ranges().len(), 1);
    }

    #[test]
    fn test_rightmost_populated_ignores_rows_below_scan() {
        let mut sheet = Sheet::new("S");
        sheet.set_text(1, 3, "Question");
        sheet.set_text(2, 9, "wide data row outside header zone");
        assert_eq!(sheet.rightmost_populated_col(1), 3);
        assert_eq!(sheet.rightmost_populated_col(10), 9);
    }

    #[test]
    fn test_rightmost_populated_skips_blank_text() {
        let mut sheet = Sheet::new("S");
        sheet.set_text(1, 2, "Question");
        sheet.set_text(1, 7, "   ");
        assert_eq!(sheet.rightmost_populated_col(10), 2);
    }

    #[test]
    fn test_display_text_trims_and_renders_numbers() {
        let mut sheet = Sheet::new("S");
        sheet.set_text(1, 1, "  padded  ");
        sheet.set_cell(1, 2, CellValue::Number(42.0));
        sheet.set_cell(1, 3, CellValue::Number(2.5));
        assert_eq!(sheet.text(1, 1).as_deref(), Some("padded"));
        assert_eq!(sheet.text(1, 2).as_deref(), Some("42"));
        assert_eq!(sheet.text(1, 3).as_deref(), Some("2.5"));
    }

    #[test]
    fn test_column_letter_names() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn test_merged_range_display_is_a1_style() {
        let range = MergedRange::new(2, 2, 4, 5);
        assert_eq!(range.to_string(), "B2:E4");
    }

    #[test]
    fn test_workbook_sheet_lookup() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("Assessment"));
        workbook.add_sheet(Sheet::new("Inventory"));
        assert!(workbook.contains_sheet("Inventory"));
        assert_eq!(workbook.first_sheet().unwrap().name(), "Assessment");
        assert_eq!(
            workbook.sheet_names(),
            vec!["Assessment".to_string(), "Inventory".to_string()]
        );
    }
}
