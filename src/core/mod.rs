//! Detection, resolution, extraction and persistence over the grid

pub mod detect;
pub mod loader;
pub mod persist;
pub mod resolve;

pub use detect::{
    detect_format, first_mostly_blank_row, locate_column_header_row, locate_row_header,
    RowHeaderLocation,
};
pub use loader::extract_questions;
pub use persist::apply_updates;
pub use resolve::{resolve_column_layout, resolve_row_layout};
