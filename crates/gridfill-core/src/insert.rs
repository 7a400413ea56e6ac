//! Data insertion into the template.
//!
//! The cursor walks right from the start of the replace range. Each data resource
//! opens a block of blank columns at the cursor, one per selected column, fills it,
//! and moves the cursor past it. Where the cursor stops is the insertion break column.

use crate::document::{CellValue, Workbook, Worksheet, WorksheetId};
use crate::error::Result;
use crate::storage::{CsvTable, FormulaEvaluator};
use gridfill_engine::engine::{CellRef, HeaderAction};

/// Position of the next data column on the target worksheet.
pub struct DataInsertionCursor<'a> {
    sheet: &'a mut Worksheet,
    column: usize,
    header_action: HeaderAction,
}

impl<'a> DataInsertionCursor<'a> {
    pub fn new(sheet: &'a mut Worksheet, start_column: usize, header_action: HeaderAction) -> Self {
        DataInsertionCursor {
            sheet,
            column: start_column,
            header_action,
        }
    }

    /// Column the next resource will be inserted at.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Copy `selection` columns of sheet `sheet_id` in `source`.
    ///
    /// Formula cells are replaced by the value `evaluator` reports for them. With
    /// [`HeaderAction::Replace`] the first `skip_rows` rows of each column are dropped,
    /// the label taking their place.
    pub fn insert_workbook_columns(
        &mut self,
        source: &Workbook,
        sheet_id: &WorksheetId,
        evaluator: &dyn FormulaEvaluator,
        selection: &[usize],
        skip_rows: usize,
        label: &str,
    ) -> Result<()> {
        let source_sheet = source.worksheet(sheet_id)?;
        let height = source_sheet.max_row().map_or(0, |row| row + 1);
        let width = source_sheet.max_column().map_or(0, |col| col + 1);
        let skip = match self.header_action {
            HeaderAction::Replace => skip_rows,
            HeaderAction::None | HeaderAction::Insert => 0,
        };

        self.sheet.insert_columns(self.column, selection.len());
        for (offset, &src_col) in selection.iter().enumerate() {
            let col = self.column + offset;
            let mut row = self.write_label(col, label);
            if src_col >= width {
                log::warn!(
                    "{}: column {} not in sheet '{}', left empty",
                    label,
                    CellRef::col_to_letters(src_col),
                    source_sheet.name
                );
                continue;
            }

            for src_row in skip..height {
                let src_ref = CellRef::new(src_col, src_row);
                let value = match source_sheet.get(&src_ref) {
                    CellValue::Formula(_) => {
                        match evaluator.value(&source_sheet.name, &src_ref) {
                            Some(value) => value,
                            None => {
                                log::warn!(
                                    "{}: no computed value for {}!{}, left empty",
                                    label,
                                    source_sheet.name,
                                    src_ref
                                );
                                CellValue::Empty
                            }
                        }
                    }
                    value => value,
                };
                self.sheet.set(CellRef::new(col, row), value);
                row += 1;
            }
        }

        self.column += selection.len();
        Ok(())
    }

    /// Copy `selection` columns of a CSV table. Unless headers are replaced, each
    /// column's own label row is copied above its values.
    pub fn insert_table_columns(&mut self, table: &CsvTable, selection: &[usize], label: &str) {
        let width = table.width();

        self.sheet.insert_columns(self.column, selection.len());
        for (offset, &src_col) in selection.iter().enumerate() {
            let col = self.column + offset;
            let mut row = self.write_label(col, label);
            if src_col >= width {
                log::warn!(
                    "{}: column {} not in data, left empty",
                    label,
                    CellRef::col_to_letters(src_col)
                );
                continue;
            }

            if self.header_action != HeaderAction::Replace {
                if let Some(name) = table.label(src_col) {
                    self.sheet.set(CellRef::new(col, row), CellValue::text(name));
                }
                row += 1;
            }
            for value in table.column(src_col) {
                self.sheet.set(CellRef::new(col, row), value);
                row += 1;
            }
        }

        self.column += selection.len();
    }

    /// Write the resource label on top of a column. Returns the first data row.
    fn write_label(&mut self, col: usize, label: &str) -> usize {
        if !self.header_action.labels_data() {
            return 0;
        }
        self.sheet.set(CellRef::new(col, 0), CellValue::text(label));
        1
    }

    /// Stop inserting; returns the insertion break column.
    pub fn finish(self) -> usize {
        self.column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::parse_csv;
    use std::collections::HashMap;

    struct Fixed(HashMap<CellRef, CellValue>);

    impl FormulaEvaluator for Fixed {
        fn value(&self, _sheet: &str, cell: &CellRef) -> Option<CellValue> {
            self.0.get(cell).cloned()
        }
    }

    fn template() -> Worksheet {
        let mut ws = Worksheet::new("Sheet1");
        ws.set(CellRef::new(0, 0), CellValue::text("keep"));
        ws.set(CellRef::new(1, 0), CellValue::text("after"));
        ws
    }

    fn source() -> Workbook {
        let mut book = Workbook::new();
        let ws = book.add_sheet("raw");
        ws.set(CellRef::new(0, 0), CellValue::text("t"));
        ws.set(CellRef::new(1, 0), CellValue::text("v"));
        ws.set(CellRef::new(0, 1), CellValue::Number(0.0));
        ws.set(CellRef::new(1, 1), CellValue::formula("=A2+1"));
        ws.set(CellRef::new(0, 2), CellValue::Number(1.0));
        ws.set(CellRef::new(1, 2), CellValue::formula("=A3+1"));
        book
    }

    fn cell(ws: &Worksheet, name: &str) -> CellValue {
        ws.get(&CellRef::from_str(name).unwrap())
    }

    #[test]
    fn test_workbook_columns_use_computed_values() {
        let mut ws = template();
        let evaluator = Fixed(HashMap::from([(CellRef::new(1, 1), CellValue::Number(1.0))]));
        let mut cursor = DataInsertionCursor::new(&mut ws, 1, HeaderAction::None);
        cursor
            .insert_workbook_columns(&source(), &WorksheetId::Index(0), &evaluator, &[1, 0], 0, "a.xlsx")
            .unwrap();
        assert_eq!(cursor.finish(), 3);

        assert_eq!(cell(&ws, "A1"), CellValue::text("keep"));
        assert_eq!(cell(&ws, "B1"), CellValue::text("v"));
        assert_eq!(cell(&ws, "B2"), CellValue::Number(1.0));
        // No computed value for B3.
        assert!(cell(&ws, "B3").is_empty());
        assert_eq!(cell(&ws, "C1"), CellValue::text("t"));
        assert_eq!(cell(&ws, "D1"), CellValue::text("after"));
    }

    #[test]
    fn test_replace_header_drops_skip_rows_and_labels() {
        let mut ws = template();
        let evaluator = Fixed(HashMap::new());
        let mut cursor = DataInsertionCursor::new(&mut ws, 1, HeaderAction::Replace);
        cursor
            .insert_workbook_columns(&source(), &WorksheetId::Name("raw".into()), &evaluator, &[0], 1, "runs/a.xlsx")
            .unwrap();
        cursor
            .insert_workbook_columns(&source(), &WorksheetId::Name("raw".into()), &evaluator, &[0], 1, "runs/b.xlsx")
            .unwrap();
        assert_eq!(cursor.finish(), 3);

        assert_eq!(cell(&ws, "B1"), CellValue::text("runs/a.xlsx"));
        assert_eq!(cell(&ws, "B2"), CellValue::Number(0.0));
        assert_eq!(cell(&ws, "B3"), CellValue::Number(1.0));
        assert_eq!(cell(&ws, "C1"), CellValue::text("runs/b.xlsx"));
        assert_eq!(cell(&ws, "D1"), CellValue::text("after"));
    }

    #[test]
    fn test_missing_source_sheet_is_an_error() {
        let mut ws = template();
        let mut cursor = DataInsertionCursor::new(&mut ws, 1, HeaderAction::None);
        let result = cursor.insert_workbook_columns(
            &source(),
            &WorksheetId::Index(4),
            &Fixed(HashMap::new()),
            &[0],
            0,
            "a.xlsx",
        );
        assert!(matches!(result, Err(crate::GridfillError::InvalidWorksheet(_))));
    }

    #[test]
    fn test_table_columns_keep_labels_unless_replaced() {
        let table = parse_csv("time,signal\n0,1.5\n1,2.5\n", 0, None).unwrap();

        let mut ws = template();
        let mut cursor = DataInsertionCursor::new(&mut ws, 1, HeaderAction::Insert);
        cursor.insert_table_columns(&table, &[1], "d/a.csv");
        assert_eq!(cursor.finish(), 2);
        assert_eq!(cell(&ws, "B1"), CellValue::text("d/a.csv"));
        assert_eq!(cell(&ws, "B2"), CellValue::text("signal"));
        assert_eq!(cell(&ws, "B3"), CellValue::Number(1.5));

        let mut ws = template();
        let mut cursor = DataInsertionCursor::new(&mut ws, 1, HeaderAction::Replace);
        cursor.insert_table_columns(&table, &[1], "d/a.csv");
        cursor.finish();
        assert_eq!(cell(&ws, "B1"), CellValue::text("d/a.csv"));
        assert_eq!(cell(&ws, "B2"), CellValue::Number(1.5));
        assert_eq!(cell(&ws, "B3"), CellValue::Number(2.5));
    }

    #[test]
    fn test_absent_column_inserts_empty_column() {
        let table = parse_csv("time\n0\n", 0, None).unwrap();
        let mut ws = template();
        let mut cursor = DataInsertionCursor::new(&mut ws, 1, HeaderAction::None);
        cursor.insert_table_columns(&table, &[0, 3], "a.csv");
        assert_eq!(cursor.finish(), 3);
        assert_eq!(cell(&ws, "B1"), CellValue::text("time"));
        assert!(cell(&ws, "C1").is_empty());
        assert_eq!(cell(&ws, "D1"), CellValue::text("after"));
    }
}
