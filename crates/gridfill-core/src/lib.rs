//! gridfill-core - workbook model, file formats, asset catalog and the fill pipeline.

pub mod catalog;
pub mod document;
pub mod error;
pub mod insert;
pub mod runner;
pub mod storage;

pub use catalog::{Asset, AssetCatalog, AssetFilter, AssetProperties, ManifestCatalog, Metadata};
pub use document::{CellValue, SweepReport, Workbook, Worksheet, WorksheetId};
pub use error::{GridfillError, Result};
pub use insert::DataInsertionCursor;
pub use runner::{DataFormat, RunOptions, RunSummary, run};

pub use gridfill_engine::engine::CellRef;
