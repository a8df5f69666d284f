use thiserror::Error;

pub type IntakeResult<T> = Result<T, IntakeError>;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook read error: {0}")]
    Workbook(String),

    #[error("workbook write error: {0}")]
    Save(String),

    #[error("no requested sheet found in workbook (requested: {requested:?}, available: {available:?})")]
    NoMatchingSheets {
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("{0} update(s) could not be applied")]
    PartialApply(usize),

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
