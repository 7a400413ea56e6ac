//! Error types for Gridfill core.

use gridfill_engine::EngineError;
use thiserror::Error;

/// Errors that can occur while filling a template.
#[derive(Error, Debug)]
pub enum GridfillError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid worksheet: {0}")]
    InvalidWorksheet(String),

    #[error("No matching assets")]
    NoMatchingAssets,

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook {path}: {source}")]
    XlsxRead {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to open template {path}: {source}")]
    TemplateRead {
        path: String,
        #[source]
        source: umya_spreadsheet::XlsxError,
    },

    #[error("Failed to write workbook {path}: {source}")]
    XlsxWrite {
        path: String,
        #[source]
        source: umya_spreadsheet::XlsxError,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Asset manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GridfillError>;
