//! Gridfill - fill a spreadsheet template with data columns from an asset catalog

mod cli;
mod config;

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use gridfill_core::ManifestCatalog;

/// Writes `level: message` lines to stderr.
struct StderrLogger {
    level: log::LevelFilter,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level().to_string().to_lowercase();
        let _ = writeln!(std::io::stderr().lock(), "{}: {}", level, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn init_logger(level: log::LevelFilter) {
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn run(args: cli::Args) -> Result<()> {
    let (config, warnings) = config::load_config(args.config.as_deref());
    init_logger(args.log_level(&config));
    for warning in warnings {
        log::warn!("{}", warning);
    }

    let options = args.run_options(&config)?;
    let root = args.catalog_root(&config);
    let mut catalog = ManifestCatalog::open(&root)
        .with_context(|| format!("failed to open catalog {}", root.display()))?;

    let summary = gridfill_core::run(&options, &mut catalog)
        .with_context(|| format!("failed to fill {}", options.template.display()))?;

    log::info!(
        "{} assets inserted, {} of {} formulas rewritten",
        summary.assets,
        summary.sweep.formulas_rewritten,
        summary.sweep.formulas_seen
    );
    println!("{}", summary.output.display());
    Ok(())
}

fn main() {
    let args = cli::Args::parse();
    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
