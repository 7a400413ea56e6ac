//! File formats: Excel workbooks in, filled templates out, CSV data in.

pub mod csv;
pub mod xlsx;

pub use csv::{CsvTable, read_csv};
pub use xlsx::{
    CachedResults, FormulaEvaluator, TemplateEdits, load_workbook, read_workbook, save_template,
};
