//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style references
//! (e.g., "A1", "$B$2", "AA100", and the bare "C" / "7" halves of whole-column
//! and whole-row ranges) and zero-indexed column/row coordinates.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.col, 1);  // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of columns on a sheet (`A` through `XFD`).
pub const MAX_COLS: usize = 16_384;
/// Number of rows on a sheet.
pub const MAX_ROWS: usize = 1_048_576;

/// A reference to a cell by column and row indices (0-indexed).
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "$AA$10").
    /// Returns None if the input is not a single cell.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        let endpoint = RefEndpoint::parse(name)?;
        Some(CellRef::new(endpoint.col?.index, endpoint.row?.index))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Convert spreadsheet column letters to a column index (A -> 0, AA -> 26).
    /// Returns None for anything that is not a column on the sheet.
    pub fn letters_to_col(letters: &str) -> Option<usize> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }

        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;
        (col < MAX_COLS).then_some(col)
    }
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellRef::from_str(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// One coordinate of a reference, remembering whether it carried a `$` marker.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Coord {
    pub index: usize,
    pub absolute: bool,
}

impl Coord {
    pub fn relative(index: usize) -> Coord {
        Coord {
            index,
            absolute: false,
        }
    }

    pub fn absolute(index: usize) -> Coord {
        Coord {
            index,
            absolute: true,
        }
    }

    /// Move by `delta`; None when the result leaves `0..limit`.
    pub fn offset(self, delta: isize, limit: usize) -> Option<Coord> {
        let index = self.index.checked_add_signed(delta)?;
        (index < limit).then_some(Coord { index, ..self })
    }
}

/// One side of a range operand: a cell (`$B2`), a whole column (`B`) or a whole row (`2`).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RefEndpoint {
    pub col: Option<Coord>,
    pub row: Option<Coord>,
}

impl RefEndpoint {
    pub fn cell(col: usize, row: usize) -> RefEndpoint {
        RefEndpoint {
            col: Some(Coord::relative(col)),
            row: Some(Coord::relative(row)),
        }
    }

    /// Parse an endpoint without any sheet qualifier. Returns None if the text is not
    /// a column, a row, or a cell within the sheet bounds.
    pub fn parse(text: &str) -> Option<RefEndpoint> {
        let caps = endpoint_re().captures(text)?;

        let col = match caps.name("col") {
            Some(m) => Some(Coord {
                index: CellRef::letters_to_col(m.as_str())?,
                absolute: caps.name("col_abs").is_some(),
            }),
            None => None,
        };

        let row = match caps.name("row") {
            Some(m) => {
                let index = m.as_str().parse::<usize>().ok()?.checked_sub(1)?;
                if index >= MAX_ROWS {
                    return None;
                }
                Some(Coord {
                    index,
                    absolute: caps.name("row_abs").is_some(),
                })
            }
            None => None,
        };

        if col.is_none() && row.is_none() {
            return None;
        }
        Some(RefEndpoint { col, row })
    }

    pub fn is_cell(&self) -> bool {
        self.col.is_some() && self.row.is_some()
    }

    pub fn is_column(&self) -> bool {
        self.col.is_some() && self.row.is_none()
    }

    pub fn is_row(&self) -> bool {
        self.col.is_none() && self.row.is_some()
    }

    /// Shift the column by `delta`. A missing column stays missing.
    pub fn offset_col(self, delta: isize) -> Option<RefEndpoint> {
        match self.col {
            Some(col) => Some(RefEndpoint {
                col: Some(col.offset(delta, MAX_COLS)?),
                ..self
            }),
            None => Some(self),
        }
    }

    /// Shift the row by `delta`. A missing row stays missing.
    pub fn offset_row(self, delta: isize) -> Option<RefEndpoint> {
        match self.row {
            Some(row) => Some(RefEndpoint {
                row: Some(row.offset(delta, MAX_ROWS)?),
                ..self
            }),
            None => Some(self),
        }
    }
}

impl fmt::Display for RefEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = self.col {
            if col.absolute {
                f.write_str("$")?;
            }
            f.write_str(&CellRef::col_to_letters(col.index))?;
        }
        if let Some(row) = self.row {
            if row.absolute {
                f.write_str("$")?;
            }
            write!(f, "{}", row.index + 1)?;
        }
        Ok(())
    }
}

fn endpoint_re() -> &'static Regex {
    static ENDPOINT_RE: OnceLock<Regex> = OnceLock::new();
    ENDPOINT_RE.get_or_init(|| {
        Regex::new(r"^(?:(?<col_abs>\$)?(?<col>[A-Za-z]{1,3}))?(?:(?<row_abs>\$)?(?<row>[0-9]+))?$")
            .expect("reference endpoint regex must compile")
    })
}
