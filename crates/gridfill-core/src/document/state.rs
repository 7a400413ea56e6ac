use crate::error::{GridfillError, Result};
use dashmap::DashMap;
use gridfill_engine::engine::CellRef;
use std::fmt;

/// A cell value as the template document exposes it.
///
/// Only `Formula` cells are seen by the sweep. A `Text` cell that happens to start
/// with `=` is a string and stays one.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    /// Formula text including the leading `=`
    Formula(String),
    Number(f64),
    Bool(bool),
    Error(String),
}

impl CellValue {
    pub fn text(text: &str) -> CellValue {
        CellValue::Text(text.to_string())
    }

    pub fn formula(text: &str) -> CellValue {
        CellValue::Formula(text.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Sparse cell storage for one worksheet.
pub type Grid = DashMap<CellRef, CellValue>;

/// A worksheet addressed by 0-based position or by name.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum WorksheetId {
    Index(usize),
    Name(String),
}

impl WorksheetId {
    /// Unsigned integers are positions, anything else is a sheet name.
    pub fn parse(s: &str) -> WorksheetId {
        match s.trim().parse::<usize>() {
            Ok(idx) => WorksheetId::Index(idx),
            Err(_) => WorksheetId::Name(s.to_string()),
        }
    }
}

impl fmt::Display for WorksheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorksheetId::Index(idx) => write!(f, "#{}", idx),
            WorksheetId::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// One named sheet of a workbook.
#[derive(Debug, Default)]
pub struct Worksheet {
    pub name: String,
    /// The cells (absent key = empty cell)
    pub grid: Grid,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            grid: Grid::new(),
        }
    }

    pub fn get(&self, cell_ref: &CellRef) -> CellValue {
        self.grid
            .get(cell_ref)
            .map(|entry| entry.value().clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Write a value; writing `Empty` clears the cell.
    pub fn set(&mut self, cell_ref: CellRef, value: CellValue) {
        if value.is_empty() {
            self.grid.remove(&cell_ref);
        } else {
            self.grid.insert(cell_ref, value);
        }
    }

    /// Snapshot of all non-empty cells, column by column, top to bottom.
    pub fn cells_by_column(&self) -> Vec<(CellRef, CellValue)> {
        let mut cells: Vec<(CellRef, CellValue)> = self
            .grid
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        cells.sort_by(|a, b| a.0.col.cmp(&b.0.col).then(a.0.row.cmp(&b.0.row)));
        cells
    }

    /// Highest occupied row, if any cell is set.
    pub fn max_row(&self) -> Option<usize> {
        self.grid.iter().map(|entry| entry.key().row).max()
    }

    /// Highest occupied column, if any cell is set.
    pub fn max_column(&self) -> Option<usize> {
        self.grid.iter().map(|entry| entry.key().col).max()
    }
}

/// An in-memory workbook: ordered worksheets, each owning its cells.
#[derive(Debug, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worksheet and return it for filling.
    pub fn add_sheet(&mut self, name: &str) -> &mut Worksheet {
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [Worksheet] {
        &mut self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Position of the sheet `id` refers to.
    pub fn resolve(&self, id: &WorksheetId) -> Result<usize> {
        let found = match id {
            WorksheetId::Index(idx) => (*idx < self.sheets.len()).then_some(*idx),
            WorksheetId::Name(name) => self.sheets.iter().position(|s| &s.name == name),
        };
        found.ok_or_else(|| {
            GridfillError::InvalidWorksheet(format!(
                "{} not found (sheets: {})",
                id,
                self.sheet_names().join(", ")
            ))
        })
    }

    pub fn worksheet(&self, id: &WorksheetId) -> Result<&Worksheet> {
        let idx = self.resolve(id)?;
        Ok(&self.sheets[idx])
    }

    pub fn worksheet_mut(&mut self, id: &WorksheetId) -> Result<&mut Worksheet> {
        let idx = self.resolve(id)?;
        Ok(&mut self.sheets[idx])
    }
}
