//! Workbook I/O boundary
//!
//! Reading goes through calamine (cached values + merged regions), writing
//! through rust_xlsxwriter. Everything in between operates on the grid
//! model, never on a live file handle.

mod reader;
mod writer;

pub use reader::WorkbookReader;
pub use writer::WorkbookWriter;

use crate::error::IntakeResult;
use crate::grid::Workbook;
use std::path::{Path, PathBuf};

/// Materialize a normalized working copy of a workbook.
///
/// The original file is never mutated. Reading and rewriting the workbook
/// collapses computed-formula cells to their cached values and sheds
/// non-standard intermediate state, which is what makes later header
/// mutation safe. Returns the copy's path together with the loaded grid.
pub fn materialize_clean_copy(
    source: &Path,
    work_dir: Option<&Path>,
) -> IntakeResult<(PathBuf, Workbook)> {
    let workbook = WorkbookReader::new(source).read()?;

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workbook.xlsx");
    let dir = match work_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir(),
    };
    let clean_path = dir.join(format!("{}.clean.xlsx", file_name));

    WorkbookWriter::new(&clean_path).write(&workbook)?;
    Ok((clean_path, workbook))
}
