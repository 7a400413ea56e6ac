use super::{CellValue, Workbook};
use crate::error::Result;
use gridfill_engine::engine::{RangeTranslator, render, tokenize};

/// Outcome of a formula sweep.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SweepReport {
    /// Formula cells inspected outside the data columns
    pub formulas_seen: usize,
    /// Formula cells whose text changed
    pub formulas_rewritten: usize,
}

impl Workbook {
    /// Repair references in every formula of every sheet after a replace pass.
    ///
    /// Columns `translator` reports as data columns hold freshly inserted values and are
    /// skipped. Sheets are visited in order and cells column by column, so when several
    /// formulas are malformed the first one in that order aborts the sweep.
    pub fn sweep_formulas(&mut self, translator: &RangeTranslator) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        if translator.is_identity() {
            log::debug!("column shift is zero and no header row was inserted; sweep skipped");
            return Ok(report);
        }

        for sheet in self.sheets_mut() {
            let mut rewritten = Vec::new();
            for (cell_ref, value) in sheet.cells_by_column() {
                if translator.is_data_column(cell_ref.col) {
                    continue;
                }
                let CellValue::Formula(text) = value else {
                    continue;
                };
                let mut tokens = tokenize(&text)?;
                match tokens.first() {
                    None => continue,
                    Some(first) if first.is_literal() => continue,
                    Some(_) => {}
                }
                report.formulas_seen += 1;
                if translator.translate_tokens(&mut tokens) > 0 {
                    rewritten.push((cell_ref, render(&tokens)));
                }
            }

            for (cell_ref, formula) in rewritten {
                log::trace!("{}!{}: {}", sheet.name, cell_ref, formula);
                sheet.set(cell_ref, CellValue::Formula(formula));
                report.formulas_rewritten += 1;
            }
        }

        log::debug!(
            "sweep rewrote {} of {} formulas",
            report.formulas_rewritten,
            report.formulas_seen
        );
        Ok(report)
    }
}
