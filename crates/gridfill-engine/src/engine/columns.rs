//! Column index bookkeeping.
//!
//! Templates are addressed with 0-based column indices throughout; spreadsheet
//! applications count from 1. The helpers here are the only place the two meet.

use crate::error::{EngineError, Result};

/// Convert a 0-based index to a spreadsheet (1-based) index.
pub fn to_spreadsheet_index(index: usize) -> usize {
    index + 1
}

/// Convert a spreadsheet (1-based) index to a 0-based index.
pub fn to_zero_based_index(index: isize) -> Result<usize> {
    if index < 1 {
        return Err(EngineError::InvalidIndex(index));
    }
    Ok(index as usize - 1)
}

/// Net number of columns the data after the replace range moved.
///
/// Replacing `[B, C]` with data that ends up occupying `[B, E]` (break column F,
/// index 5) shifts later columns by 2. Replacing `[B, D]` with two columns
/// (break column D, index 3) shifts them by -1.
pub fn column_shift(replace_end: isize, insertion_break_column: isize) -> isize {
    insertion_break_column - replace_end - 1
}

/// Inclusive span of 0-based template columns deleted and replaced with data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ReplaceRange {
    start: usize,
    end: usize,
}

impl ReplaceRange {
    pub fn new(start: usize, end: usize) -> Result<ReplaceRange> {
        if end < start {
            return Err(EngineError::InvalidReplaceRange { start, end });
        }
        Ok(ReplaceRange { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of columns deleted from the template.
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    /// Shift of everything right of the range once data stops before `insertion_break_column`.
    pub fn column_shift(&self, insertion_break_column: usize) -> isize {
        column_shift(self.end as isize, insertion_break_column as isize)
    }
}
