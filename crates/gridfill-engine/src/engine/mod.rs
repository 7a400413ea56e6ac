//! Reference engine API.
//!
//! Everything here is pure: no workbook is touched, only reference text and indices.
//!
//! - [`CellRef`], [`RefEndpoint`], [`Coord`] - A1 notation ↔ row/col indices
//! - [`ReplaceRange`], [`column_shift`] - column bookkeeping for a replace pass
//! - [`ColumnSelection`] - classification of raw column selectors
//! - [`FormulaToken`], [`RangeOperand`], [`tokenize`], [`render`] - formula token model
//! - [`RangeTranslator`] - reference repair after a column block was replaced

mod cell_ref;
mod columns;
mod formula;
mod selector;
mod translate;

pub use cell_ref::{CellRef, Coord, MAX_COLS, MAX_ROWS, RefEndpoint};
pub use columns::{ReplaceRange, column_shift, to_spreadsheet_index, to_zero_based_index};
pub use formula::{Boundaries, FormulaToken, RangeOperand, is_formula, render, tokenize};
pub use selector::{ColumnId, ColumnSelection};
pub use translate::{HeaderAction, RangeTranslator, translate_range};
