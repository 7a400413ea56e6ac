//! Workbook model: sheets of sparse cells, positional edits, and the formula sweep.

mod ops;
mod state;
mod sweep;

pub use state::{CellValue, Grid, Workbook, Worksheet, WorksheetId};
pub use sweep::SweepReport;
