//! The fill pipeline: template in, data inserted, references repaired, output registered.

use crate::catalog::{AssetCatalog, AssetFilter, AssetProperties, relative_path};
use crate::document::{SweepReport, WorksheetId};
use crate::error::{GridfillError, Result};
use crate::insert::DataInsertionCursor;
use crate::storage::{TemplateEdits, read_csv, read_workbook, save_template};
use gridfill_engine::engine::{
    CellRef, ColumnSelection, HeaderAction, RangeTranslator, ReplaceRange,
};
use std::path::PathBuf;

/// How data resources are read.
#[derive(Clone, Debug, PartialEq)]
pub enum DataFormat {
    /// Delimited text: `skip_rows` leading lines dropped, `comment` lines ignored.
    Spreadsheet { skip_rows: usize, comment: Option<u8> },
    /// An Excel workbook; data is read from `sheet`.
    ExcelWorkbook { sheet: WorksheetId, skip_rows: usize },
}

/// Everything one run needs.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub template: PathBuf,
    pub worksheet: WorksheetId,
    pub replace_range: ReplaceRange,
    pub data_format: DataFormat,
    pub column_selection: ColumnSelection,
    pub header_action: HeaderAction,
    /// Output location relative to the catalog root
    pub output: PathBuf,
    pub asset_filter: AssetFilter,
    pub output_properties: AssetProperties,
}

/// What a run did.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub assets: usize,
    pub insertion_break_column: usize,
    pub sweep: SweepReport,
    /// Absolute path of the saved workbook
    pub output: PathBuf,
}

/// Fill the template with data from every matching asset and save it to the catalog.
pub fn run(options: &RunOptions, catalog: &mut dyn AssetCatalog) -> Result<RunSummary> {
    let selection = match &options.column_selection {
        ColumnSelection::Index(indices) => indices.clone(),
        ColumnSelection::Header(_) => {
            return Err(GridfillError::NotImplemented(
                "selecting columns by header label".to_string(),
            ));
        }
    };
    let output_path = relative_path(&options.output)?;

    let (mut book, _) = read_workbook(&options.template)?;
    let target = book.resolve(&options.worksheet)?;
    log::info!(
        "template {} sheet '{}'",
        options.template.display(),
        book.sheets()[target].name
    );

    let assets = catalog.find_assets(&options.asset_filter)?;
    if assets.is_empty() {
        return Err(GridfillError::NoMatchingAssets);
    }
    log::info!("{} matching assets", assets.len());

    let replace = options.replace_range;
    book.sheets_mut()[target].delete_columns(replace.start(), replace.width());
    log::info!(
        "deleted template columns {}:{}",
        CellRef::col_to_letters(replace.start()),
        CellRef::col_to_letters(replace.end())
    );

    if options.header_action == HeaderAction::Insert {
        for sheet in book.sheets_mut() {
            sheet.insert_rows(0, 1);
        }
    }

    let root = catalog.root().to_path_buf();
    let mut cursor = DataInsertionCursor::new(
        &mut book.sheets_mut()[target],
        replace.start(),
        options.header_action,
    );
    for asset in &assets {
        let file = asset.file(&root);
        let label = asset.label();
        log::debug!("inserting {} at column {}", label, cursor.column());
        match &options.data_format {
            DataFormat::Spreadsheet { skip_rows, comment } => {
                let table = read_csv(&file, *skip_rows, *comment)?;
                cursor.insert_table_columns(&table, &selection, &label);
            }
            DataFormat::ExcelWorkbook { sheet, skip_rows } => {
                let (source, cached) = read_workbook(&file)?;
                cursor.insert_workbook_columns(&source, sheet, &cached, &selection, *skip_rows, &label)?;
            }
        }
    }
    let insertion_break_column = cursor.finish();

    let translator = RangeTranslator::new(replace, insertion_break_column, options.header_action);
    log::info!(
        "data ends before column {}, shifting later references by {}",
        insertion_break_column,
        translator.column_shift()
    );
    let sweep = book.sweep_formulas(&translator)?;

    let output = root.join(&output_path);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let edits = TemplateEdits {
        sheet: book.sheets()[target].name.clone(),
        replace,
        inserted_columns: insertion_break_column - replace.start(),
        header_row: options.header_action == HeaderAction::Insert,
    };
    save_template(&options.template, &book, &edits, &output)?;
    let output = catalog.add_asset(&output_path, &options.output_properties)?;
    log::info!("saved {}", output.display());

    Ok(RunSummary {
        assets: assets.len(),
        insertion_break_column,
        sweep,
        output,
    })
}
