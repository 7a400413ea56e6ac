use super::{CellValue, Worksheet};
use gridfill_engine::engine::CellRef;

/// Dimension for row/column operations
#[derive(Copy, Clone)]
enum Dimension {
    Row,
    Column,
}

impl Dimension {
    /// Get the coordinate value from a CellRef for this dimension
    fn get_coord(&self, cell_ref: &CellRef) -> usize {
        match self {
            Dimension::Row => cell_ref.row,
            Dimension::Column => cell_ref.col,
        }
    }

    /// Create a new CellRef with modified coordinate in this dimension
    fn new_cell_ref(&self, cell_ref: &CellRef, new_coord: usize) -> CellRef {
        match self {
            Dimension::Row => CellRef::new(cell_ref.col, new_coord),
            Dimension::Column => CellRef::new(new_coord, cell_ref.row),
        }
    }
}

/// Positional edits. Cells move; formula text is left exactly as written, reference
/// repair is the sweep's job.
impl Worksheet {
    /// Take every cell at or after `at` out of the grid.
    fn take_from(&mut self, dim: Dimension, at: usize) -> Vec<(CellRef, CellValue)> {
        let cells: Vec<(CellRef, CellValue)> = self
            .grid
            .iter()
            .filter(|entry| dim.get_coord(entry.key()) >= at)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (cell_ref, _) in &cells {
            self.grid.remove(cell_ref);
        }
        cells
    }

    fn insert_dimension(&mut self, dim: Dimension, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        for (cell_ref, value) in self.take_from(dim, at) {
            let coord = dim.get_coord(&cell_ref);
            self.grid.insert(dim.new_cell_ref(&cell_ref, coord + count), value);
        }
    }

    fn delete_dimension(&mut self, dim: Dimension, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        for (cell_ref, value) in self.take_from(dim, at) {
            let coord = dim.get_coord(&cell_ref);
            if coord >= at + count {
                self.grid.insert(dim.new_cell_ref(&cell_ref, coord - count), value);
            }
        }
    }

    /// Insert `count` empty rows above row `at`
    pub fn insert_rows(&mut self, at: usize, count: usize) {
        self.insert_dimension(Dimension::Row, at, count);
    }

    /// Delete `count` rows starting at row `at`
    pub fn delete_rows(&mut self, at: usize, count: usize) {
        self.delete_dimension(Dimension::Row, at, count);
    }

    /// Insert `count` empty columns left of column `at`
    pub fn insert_columns(&mut self, at: usize, count: usize) {
        self.insert_dimension(Dimension::Column, at, count);
    }

    /// Delete `count` columns starting at column `at`
    pub fn delete_columns(&mut self, at: usize, count: usize) {
        self.delete_dimension(Dimension::Column, at, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Worksheet {
        let mut ws = Worksheet::new("Sheet1");
        for col in 0..5 {
            ws.set(CellRef::new(col, 0), CellValue::Number(col as f64));
            ws.set(CellRef::new(col, 1), CellValue::formula("=A1"));
        }
        ws
    }

    #[test]
    fn test_delete_columns_closes_gap() {
        let mut ws = sheet();
        ws.delete_columns(1, 2);
        assert_eq!(ws.get(&CellRef::new(0, 0)), CellValue::Number(0.0));
        assert_eq!(ws.get(&CellRef::new(1, 0)), CellValue::Number(3.0));
        assert_eq!(ws.get(&CellRef::new(2, 0)), CellValue::Number(4.0));
        assert_eq!(ws.max_column(), Some(2));
    }

    #[test]
    fn test_insert_columns_opens_blank_block() {
        let mut ws = sheet();
        ws.insert_columns(1, 3);
        assert_eq!(ws.get(&CellRef::new(0, 0)), CellValue::Number(0.0));
        for col in 1..4 {
            assert!(ws.get(&CellRef::new(col, 0)).is_empty());
        }
        assert_eq!(ws.get(&CellRef::new(4, 0)), CellValue::Number(1.0));
        assert_eq!(ws.max_column(), Some(7));
    }

    #[test]
    fn test_insert_rows_moves_cells_down() {
        let mut ws = sheet();
        ws.insert_rows(0, 1);
        assert!(ws.get(&CellRef::new(2, 0)).is_empty());
        assert_eq!(ws.get(&CellRef::new(2, 1)), CellValue::Number(2.0));
        assert_eq!(ws.max_row(), Some(2));
    }

    #[test]
    fn test_positional_edits_leave_formula_text_alone() {
        let mut ws = sheet();
        ws.insert_columns(0, 2);
        ws.delete_rows(0, 1);
        assert_eq!(ws.get(&CellRef::new(2, 0)), CellValue::formula("=A1"));
    }

    #[test]
    fn test_zero_count_is_noop() {
        let mut ws = sheet();
        ws.insert_columns(0, 0);
        ws.delete_columns(0, 0);
        assert_eq!(ws.grid.len(), 10);
    }
}
