//! Error types for the Gridfill engine.

use thiserror::Error;

/// Errors raised while classifying selections, converting indices or decoding references.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid column selection: {0}")]
    InvalidSelector(String),

    #[error("Spreadsheet indices must be greater than 0, got {0}")]
    InvalidIndex(isize),

    #[error("Invalid range `{0}`")]
    MalformedRange(String),

    #[error("Invalid replace range: end column {end} is before start column {start}")]
    InvalidReplaceRange { start: usize, end: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
