//! Intake - Excel questionnaire loading and answer persistence
//!
//! This library finds the header layout of questionnaire worksheets,
//! extracts their questions, and writes answers back without corrupting
//! merged cells. The original workbook is never touched; every load pass
//! works on a clean copy.
//!
//! # Features
//!
//! - Row-based and column-based questionnaire detection
//! - Find-or-create resolution of answer/confidence/provenance columns
//! - Merge-safe cell writes with a typed application report
//! - Bounded concurrent answer drafting with rate-limit retry
//!
//! # Example
//!
//! ```no_run
//! use intake::session::{LoadOptions, Session};
//!
//! let mut session = Session::open("questionnaire.xlsx", &LoadOptions::default())?;
//! for question in session.questions() {
//!     println!("{}: {}", question.sheet_name, question.question_text);
//! }
//!
//! let updates = Vec::new();
//! let report = session.persist(&updates)?;
//! println!("{}", report.summary());
//! # Ok::<(), intake::error::IntakeError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod grid;
pub mod review;
pub mod session;
pub mod types;
pub mod vocab;

// Re-export commonly used types
pub use error::{IntakeError, IntakeResult};
pub use session::{LoadOptions, Session};
pub use types::{
    AnswerUpdate, Confidence, HeaderMap, LoadReport, PersistReport, QuestionRecord, SheetFormat,
};
