use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};

use crate::config::Config;
use gridfill_core::catalog::parse_metadata_args;
use gridfill_core::{AssetFilter, AssetProperties, DataFormat, RunOptions, WorksheetId};
use gridfill_engine::engine::{ColumnSelection, HeaderAction, ReplaceRange};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DataFormatArg {
    /// Delimited text (CSV)
    Spreadsheet,
    /// Excel workbook
    Excel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeaderActionArg {
    None,
    Insert,
    Replace,
}

impl From<HeaderActionArg> for HeaderAction {
    fn from(arg: HeaderActionArg) -> Self {
        match arg {
            HeaderActionArg::None => HeaderAction::None,
            HeaderActionArg::Insert => HeaderAction::Insert,
            HeaderActionArg::Replace => HeaderAction::Replace,
        }
    }
}

/// Insert data columns from catalog assets into a spreadsheet template, repairing
/// the template's formulas around them.
#[derive(Parser, Debug)]
#[command(name = "gridfill", version)]
pub struct Args {
    /// Template workbook (.xlsx).
    template: PathBuf,

    /// Worksheet to fill: 0-based index or sheet name.
    worksheet: String,

    /// First template column replaced by data (0-based).
    #[arg(long)]
    replace_start: usize,

    /// Last template column replaced by data (0-based, inclusive).
    #[arg(long)]
    replace_end: usize,

    /// Format of the data assets.
    #[arg(long = "data-format-type", value_enum)]
    data_format: DataFormatArg,

    /// Columns to copy from each asset: indices (`0 2`), letters (`A C`), or header labels.
    #[arg(long, num_args = 1.., required = true)]
    data_columns: Vec<String>,

    /// How inserted data is labelled [default: config, else none].
    #[arg(long, value_enum)]
    header_action: Option<HeaderActionArg>,

    /// Output path, relative to the catalog root.
    #[arg(long)]
    output: PathBuf,

    /// Lines starting with this character are ignored (spreadsheet data only).
    #[arg(long, value_name = "CHAR")]
    comment_character: Option<char>,

    /// Sheet to read from Excel data: 0-based index or sheet name.
    #[arg(long, value_name = "ID")]
    excel_sheet: Option<String>,

    /// Leading rows to skip in each data asset.
    #[arg(long, default_value_t = 0)]
    skip_rows: usize,

    /// Asset name filter for input data.
    #[arg(long)]
    filter_name: Option<String>,

    /// Asset type filter for input data.
    #[arg(long)]
    filter_type: Option<String>,

    /// Asset tags filter for input data.
    #[arg(long, num_args = 1..)]
    filter_tags: Vec<String>,

    /// Asset metadata filter for input data, as `key=value` (repeatable).
    #[arg(long, value_name = "KEY=VALUE")]
    filter_metadata: Vec<String>,

    /// Asset name for the output.
    #[arg(long)]
    output_name: Option<String>,

    /// Asset type for the output.
    #[arg(long)]
    output_type: Option<String>,

    /// Asset tags for the output.
    #[arg(long, num_args = 1..)]
    output_tags: Vec<String>,

    /// Asset metadata for the output, as `key=value` (repeatable).
    #[arg(long, value_name = "KEY=VALUE")]
    output_metadata: Vec<String>,

    /// Catalog root [default: config, else current directory].
    #[arg(long, value_name = "DIR")]
    pub catalog: Option<PathBuf>,

    /// Config file to use instead of the user config.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Log level from the flags, falling back to the config and then `warn`.
    pub fn log_level(&self, config: &Config) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => config.log_level().unwrap_or(log::LevelFilter::Warn),
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Catalog root from the flag, the config, or the working directory.
    pub fn catalog_root(&self, config: &Config) -> PathBuf {
        self.catalog
            .clone()
            .or_else(|| config.catalog.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn run_options(&self, config: &Config) -> Result<RunOptions> {
        let replace_range = ReplaceRange::new(self.replace_start, self.replace_end)
            .context("invalid --replace-start/--replace-end")?;
        let column_selection =
            ColumnSelection::parse(&self.data_columns).context("invalid --data-columns")?;

        let data_format = match self.data_format {
            DataFormatArg::Spreadsheet => DataFormat::Spreadsheet {
                skip_rows: self.skip_rows,
                comment: self.comment_byte()?,
            },
            DataFormatArg::Excel => {
                let Some(sheet) = self.excel_sheet.as_deref() else {
                    bail!("--excel-sheet is required for excel data");
                };
                DataFormat::ExcelWorkbook {
                    sheet: WorksheetId::parse(sheet),
                    skip_rows: self.skip_rows,
                }
            }
        };

        let header_action = self
            .header_action
            .map(HeaderAction::from)
            .or(config.header_action)
            .unwrap_or_default();

        let asset_filter = AssetFilter {
            name: self.filter_name.clone(),
            kind: self.filter_type.clone(),
            tags: self.filter_tags.clone(),
            metadata: parse_metadata_args(&self.filter_metadata)
                .context("invalid --filter-metadata")?,
        };
        let output_properties = AssetProperties {
            name: self.output_name.clone(),
            kind: self.output_type.clone(),
            tags: self.output_tags.clone(),
            metadata: parse_metadata_args(&self.output_metadata)
                .context("invalid --output-metadata")?,
        };

        Ok(RunOptions {
            template: self.template.clone(),
            worksheet: WorksheetId::parse(&self.worksheet),
            replace_range,
            data_format,
            column_selection,
            header_action,
            output: self.output.clone(),
            asset_filter,
            output_properties,
        })
    }

    fn comment_byte(&self) -> Result<Option<u8>> {
        match self.comment_character {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => bail!("--comment-character must be ASCII, got `{}`", c),
        }
    }
}
