//! Excel workbook import/export.
//!
//! Reading goes through calamine: cell values first, then the formula layer on top so
//! a formula cell becomes [`CellValue::Formula`]. The values calamine reports for formula
//! cells are the results last computed by a spreadsheet application; they are kept aside
//! as [`CachedResults`].
//!
//! Saving never rebuilds the template from values. [`save_template`] reopens the template
//! with umya-spreadsheet, replays the run's column and row edits on it, and writes back
//! only the cells the run produced. Styles, number formats, column widths, merged cells
//! and defined names travel with the document.

use crate::document::{CellValue, Workbook, WorksheetId};
use crate::error::{GridfillError, Result};
use calamine::{Data, Reader, Sheets, open_workbook_auto};
use gridfill_engine::engine::{CellRef, ReplaceRange, is_formula};
use std::path::Path;

/// Sheet bounds of the xlsx format.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Supplies the computed value of a formula cell.
pub trait FormulaEvaluator {
    /// Value of the formula at `cell` on sheet `sheet`, None if it is unknown.
    fn value(&self, sheet: &str, cell: &CellRef) -> Option<CellValue>;
}

/// Formula results stored in the file by the application that last saved it.
///
/// Files written by tools that never compute formulas have none.
#[derive(Debug, Default)]
pub struct CachedResults {
    values: Workbook,
}

impl FormulaEvaluator for CachedResults {
    fn value(&self, sheet: &str, cell: &CellRef) -> Option<CellValue> {
        let sheet = self
            .values
            .worksheet(&WorksheetId::Name(sheet.to_string()))
            .ok()?;
        Some(sheet.get(cell)).filter(|value| !value.is_empty())
    }
}

/// Load a workbook; formula cells carry their `=` text.
pub fn load_workbook(path: &Path) -> Result<Workbook> {
    read_workbook(path).map(|(book, _)| book)
}

/// Load a workbook along with the cached results of its formulas.
pub fn read_workbook(path: &Path) -> Result<(Workbook, CachedResults)> {
    let mut source: Sheets<_> = open_workbook_auto(path).map_err(|e| read_error(path, e))?;
    let sheet_names: Vec<String> = source.sheet_names().to_vec();

    let mut book = Workbook::new();
    let mut cached = CachedResults::default();

    for sheet_name in &sheet_names {
        let range = source
            .worksheet_range(sheet_name)
            .map_err(|e| read_error(path, e))?;
        let sheet = book.add_sheet(sheet_name);
        let values = cached.values.add_sheet(sheet_name);

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, data) in row.iter().enumerate() {
                let value = cell_value(data);
                if value.is_empty() {
                    continue;
                }
                let cell_ref =
                    CellRef::new(start_col as usize + col_idx, start_row as usize + row_idx);
                sheet.set(cell_ref.clone(), value.clone());
                values.set(cell_ref, value);
            }
        }

        // Formula range may start at a different offset than data range
        match source.worksheet_formula(sheet_name) {
            Ok(formulas) => {
                let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
                for (row_idx, row) in formulas.rows().enumerate() {
                    for (col_idx, formula) in row.iter().enumerate() {
                        if formula.is_empty() {
                            continue;
                        }
                        let cell_ref = CellRef::new(
                            start_col as usize + col_idx,
                            start_row as usize + row_idx,
                        );
                        let text = if formula.starts_with('=') {
                            formula.clone()
                        } else {
                            format!("={}", formula)
                        };
                        if is_formula(&text) {
                            sheet.set(cell_ref, CellValue::Formula(text));
                        }
                    }
                }
            }
            Err(e) => log::warn!("{}: no formulas read for sheet '{}': {}", path.display(), sheet_name, e),
        }

        log::debug!(
            "{}: loaded sheet '{}' ({} cells)",
            path.display(),
            sheet_name,
            sheet.grid.len()
        );
    }

    Ok((book, cached))
}

/// Structural edits a run made to the template.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateEdits {
    /// Sheet the data went into
    pub sheet: String,
    /// Template columns deleted
    pub replace: ReplaceRange,
    /// Data columns opened at `replace.start()`
    pub inserted_columns: usize,
    /// A row was inserted at the top of every sheet
    pub header_row: bool,
}

impl TemplateEdits {
    fn is_data_cell(&self, sheet: &str, cell_ref: &CellRef) -> bool {
        let start = self.replace.start();
        sheet == self.sheet && (start..start + self.inserted_columns).contains(&cell_ref.col)
    }
}

/// Save `book` to `path` on top of the template it was loaded from.
///
/// The template at `template` is reopened and `edits` are applied to it, so every
/// template cell moves along with its formatting. Then the inserted data cells and all
/// formulas are copied over from `book`; any other template cell is left as it was.
pub fn save_template(
    template: &Path,
    book: &Workbook,
    edits: &TemplateEdits,
    path: &Path,
) -> Result<()> {
    let mut document = umya_spreadsheet::reader::xlsx::read(template).map_err(|source| {
        GridfillError::TemplateRead {
            path: template.display().to_string(),
            source,
        }
    })?;

    let start = CellRef::col_to_letters(edits.replace.start());
    document_sheet(&mut document, &edits.sheet)?
        .remove_column(&start, &column_count(edits.replace.width())?);
    if edits.header_row {
        for sheet in document.get_sheet_collection_mut().iter_mut() {
            sheet.insert_new_row(&1, &1);
        }
    }
    if edits.inserted_columns > 0 {
        document_sheet(&mut document, &edits.sheet)?
            .insert_new_column(&start, &column_count(edits.inserted_columns)?);
    }

    for source in book.sheets() {
        let sheet = document_sheet(&mut document, &source.name)?;
        let mut written = 0;
        for (cell_ref, value) in source.cells_by_column() {
            let formula = matches!(value, CellValue::Formula(_));
            if !formula && !edits.is_data_cell(&source.name, &cell_ref) {
                continue;
            }
            if cell_ref.row >= MAX_ROWS || cell_ref.col >= MAX_COLUMNS {
                return Err(out_of_bounds(&source.name, &cell_ref));
            }

            let cell = sheet.get_cell_mut(cell_ref.to_string().as_str());
            match value {
                CellValue::Empty => {}
                CellValue::Formula(text) => {
                    let body = text.strip_prefix('=').unwrap_or(&text);
                    cell.set_formula(body.to_string());
                }
                CellValue::Text(text) => {
                    cell.set_value_string(text);
                }
                CellValue::Number(n) => {
                    cell.set_value_number(n);
                }
                CellValue::Bool(b) => {
                    cell.set_value_bool(b);
                }
                // Error literals such as `#N/A` are recognised from their text
                CellValue::Error(text) => {
                    cell.set_value(text);
                }
            }
            written += 1;
        }
        log::debug!("{}: wrote {} cells of sheet '{}'", path.display(), written, source.name);
    }

    umya_spreadsheet::writer::xlsx::write(&document, path).map_err(|source| {
        GridfillError::XlsxWrite {
            path: path.display().to_string(),
            source,
        }
    })?;
    Ok(())
}

fn document_sheet<'a>(
    document: &'a mut umya_spreadsheet::Spreadsheet,
    name: &str,
) -> Result<&'a mut umya_spreadsheet::Worksheet> {
    document
        .get_sheet_by_name_mut(name)
        .ok_or_else(|| GridfillError::InvalidWorksheet(format!("'{}' not found in template", name)))
}

fn column_count(count: usize) -> Result<u32> {
    u32::try_from(count)
        .ok()
        .filter(|&n| (n as usize) <= MAX_COLUMNS)
        .ok_or_else(|| GridfillError::InvalidArgument(format!("{} columns exceed the sheet", count)))
}

/// Convert a calamine value to a cell value.
fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        // Serial date number, as stored in the file
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn read_error(path: &Path, source: calamine::Error) -> GridfillError {
    GridfillError::XlsxRead {
        path: path.display().to_string(),
        source,
    }
}

fn out_of_bounds(sheet: &str, cell_ref: &CellRef) -> GridfillError {
    GridfillError::InvalidArgument(format!("cell {}!{} is outside the sheet", sheet, cell_ref))
}
