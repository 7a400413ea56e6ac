//! Reference repair after a template column block was replaced.
//!
//! Deleting the replace range and inserting a block of data columns moves every
//! column to its right. Spreadsheet applications fix references up on manual
//! inserts and deletes; this module applies the same adjustment to formula text.
//!
//! Three rules are applied to each range operand, in order:
//!
//! 1. **Boundary expansion**: a range whose right edge sat on the last replaced
//!    column stretches its right edge by the column shift (a single cell moves).
//! 2. **Post-boundary shift**: a range lying entirely right of the replace range
//!    moves by the column shift.
//! 3. **Header row shift**: with [`HeaderAction::Insert`], a range whose columns all
//!    lie within `[replace.start, insertion_break_column]` moves down one row.
//!
//! Rules 1 and 2 test the operand as written. Rule 3 tests the columns left by 1 and 2.

use serde::{Deserialize, Serialize};

use super::cell_ref::RefEndpoint;
use super::columns::ReplaceRange;
use super::formula::{FormulaToken, RangeOperand};
use crate::error::Result;

/// How data resources are labelled when inserted.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderAction {
    /// Data is copied as-is.
    #[default]
    None,
    /// A new top row is inserted and labelled with each resource's path.
    Insert,
    /// The resource's own headers are replaced by its path.
    Replace,
}

impl HeaderAction {
    /// Whether inserted data carries a label row on top.
    pub fn labels_data(self) -> bool {
        match self {
            HeaderAction::None => false,
            HeaderAction::Insert | HeaderAction::Replace => true,
        }
    }
}

/// Translate one range operand.
///
/// Returns None when the adjusted reference would fall off the sheet; callers render
/// such an operand as `#REF!`.
pub fn translate_range(
    range: &RangeOperand,
    replace: ReplaceRange,
    column_shift: isize,
    header_action: HeaderAction,
    insertion_break_column: usize,
) -> Option<RangeOperand> {
    let bounds = range.boundaries();
    let mut start = range.start();
    let mut end = range.end();

    if bounds.col_end == Some(replace.end()) {
        match end.as_mut() {
            Some(end) => *end = end.offset_col(column_shift)?,
            None => start = start.offset_col(column_shift)?,
        }
    }

    if bounds.col_start.is_some_and(|col| col > replace.end()) {
        start = start.offset_col(column_shift)?;
        if let Some(end) = end.as_mut() {
            *end = end.offset_col(column_shift)?;
        }
    }

    if header_action == HeaderAction::Insert {
        let within = |endpoint: &RefEndpoint| {
            endpoint
                .col
                .is_some_and(|col| (replace.start()..=insertion_break_column).contains(&col.index))
        };
        let shifted = match &end {
            None => within(&start),
            Some(end) => within(&start) && within(end),
        };
        if shifted {
            // Past the last row: leave the rows alone.
            let moved = match end {
                None => start.offset_row(1).map(|s| (s, None)),
                Some(e) => start
                    .offset_row(1)
                    .zip(e.offset_row(1))
                    .map(|(s, e)| (s, Some(e))),
            };
            if let Some((s, e)) = moved {
                start = s;
                end = e;
            }
        }
    }

    Some(range.with_endpoints(start, end))
}

/// Repairs references for one replace pass. The column shift is computed once and
/// reused for every operand of every formula.
#[derive(Clone, Copy, Debug)]
pub struct RangeTranslator {
    replace: ReplaceRange,
    insertion_break_column: usize,
    column_shift: isize,
    header_action: HeaderAction,
}

impl RangeTranslator {
    pub fn new(
        replace: ReplaceRange,
        insertion_break_column: usize,
        header_action: HeaderAction,
    ) -> Self {
        RangeTranslator {
            replace,
            insertion_break_column,
            column_shift: replace.column_shift(insertion_break_column),
            header_action,
        }
    }

    pub fn replace_range(&self) -> ReplaceRange {
        self.replace
    }

    pub fn insertion_break_column(&self) -> usize {
        self.insertion_break_column
    }

    pub fn column_shift(&self) -> isize {
        self.column_shift
    }

    pub fn header_action(&self) -> HeaderAction {
        self.header_action
    }

    /// True when no reference can change: no horizontal shift and no inserted row.
    pub fn is_identity(&self) -> bool {
        self.column_shift == 0 && self.header_action != HeaderAction::Insert
    }

    /// Whether a template column holds freshly inserted data (or the column right after it).
    pub fn is_data_column(&self, col: usize) -> bool {
        (self.replace.start()..=self.insertion_break_column).contains(&col)
    }

    pub fn translate(&self, range: &RangeOperand) -> Option<RangeOperand> {
        translate_range(
            range,
            self.replace,
            self.column_shift,
            self.header_action,
            self.insertion_break_column,
        )
    }

    /// Translate reference text such as `B1:D1`; fails with `MalformedRange` if it is not
    /// one or two endpoints.
    pub fn translate_text(&self, text: &str) -> Result<String> {
        let range: RangeOperand = text.parse()?;
        Ok(match self.translate(&range) {
            Some(translated) => translated.text().to_string(),
            None => range.ref_error(),
        })
    }

    /// Translate every range token in place. Returns how many tokens changed.
    pub fn translate_tokens(&self, tokens: &mut [FormulaToken]) -> usize {
        let mut changed = 0;
        for token in tokens.iter_mut() {
            let FormulaToken::Range(range) = token else {
                continue;
            };
            let replacement = match self.translate(range) {
                Some(translated) if translated == *range => continue,
                Some(translated) => FormulaToken::Range(translated),
                None => FormulaToken::Operand(range.ref_error()),
            };
            *token = replacement;
            changed += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::formula::{render, tokenize};

    fn replace(start: usize, end: usize) -> ReplaceRange {
        ReplaceRange::new(start, end).unwrap()
    }

    fn translate(text: &str, shift: isize, action: HeaderAction, break_col: usize) -> String {
        let range: RangeOperand = text.parse().unwrap();
        translate_range(&range, replace(1, 3), shift, action, break_col)
            .map(|r| r.text().to_string())
            .unwrap_or_else(|| range.ref_error())
    }

    #[test]
    fn test_boundary_expansion_moves_only_right_edge() {
        assert_eq!(translate("B1:D1", 2, HeaderAction::None, 6), "B1:F1");
        assert_eq!(translate("A5:D9", -1, HeaderAction::None, 3), "A5:C9");
    }

    #[test]
    fn test_boundary_expansion_moves_single_cell() {
        assert_eq!(translate("D4", 2, HeaderAction::None, 6), "F4");
        assert_eq!(translate("$D$4", 2, HeaderAction::None, 6), "$F$4");
    }

    #[test]
    fn test_post_boundary_shift_is_rigid() {
        assert_eq!(translate("F2:G2", -1, HeaderAction::None, 3), "E2:F2");
        assert_eq!(translate("E7", 3, HeaderAction::None, 7), "H7");
        assert_eq!(translate("Data!$E:$F", 1, HeaderAction::None, 5), "Data!$F:$G");
    }

    #[test]
    fn test_ranges_left_of_or_inside_boundary_are_untouched() {
        assert_eq!(translate("A1:A9", 4, HeaderAction::None, 8), "A1:A9");
        assert_eq!(translate("B2:C2", 4, HeaderAction::None, 8), "B2:C2");
        // Starts inside, ends past the boundary: neither rule applies.
        assert_eq!(translate("C1:H1", 4, HeaderAction::None, 8), "C1:H1");
    }

    #[test]
    fn test_zero_shift_without_insert_is_identity() {
        for text in ["A1", "b1:d1", "$D$1", "E2:G9", "C:D", "2:3", "'S 1'!D1:E4"] {
            assert_eq!(translate(text, 0, HeaderAction::None, 4), text);
            assert_eq!(translate(text, 0, HeaderAction::Replace, 4), text);
        }
    }

    #[test]
    fn test_header_insert_shifts_rows_inside_data_span() {
        // Data occupies B..=E, break column F (5).
        assert_eq!(translate("B2:C3", 1, HeaderAction::Insert, 5), "B3:C4");
        assert_eq!(translate("C2", 1, HeaderAction::Insert, 5), "C3");
        // Expanded by rule 1 first (D -> E), still inside the span.
        assert_eq!(translate("B1:D1", 1, HeaderAction::Insert, 5), "B2:E2");
    }

    #[test]
    fn test_header_rows_untouched_without_insert() {
        assert_eq!(translate("B2:C3", 1, HeaderAction::None, 5), "B2:C3");
        assert_eq!(translate("B2:C3", 1, HeaderAction::Replace, 5), "B2:C3");
    }

    #[test]
    fn test_straddling_ranges_keep_rows() {
        // A is left of the data span, C inside it.
        assert_eq!(translate("A2:C3", 1, HeaderAction::Insert, 5), "A2:C3");
        assert_eq!(translate("A2:C3", 1, HeaderAction::None, 5), "A2:C3");
        // Shifted right edge leaves the span.
        assert_eq!(translate("E1:F1", 3, HeaderAction::Insert, 7), "H1:I1");
    }

    #[test]
    fn test_header_insert_on_last_row_is_rejected_silently() {
        assert_eq!(translate("B1048576", 0, HeaderAction::Insert, 4), "B1048576");
        assert_eq!(translate("B1:C1048576", 0, HeaderAction::Insert, 4), "B1:C1048576");
    }

    #[test]
    fn test_reference_pushed_off_sheet_becomes_ref_error() {
        let range: RangeOperand = "Sheet1!A1".parse().unwrap();
        let moved = translate_range(&range, replace(0, 0), -1, HeaderAction::None, 0);
        assert!(moved.is_none());
        assert_eq!(range.ref_error(), "Sheet1!#REF!");
    }

    #[test]
    fn test_translator_computes_shift_once() {
        let translator = RangeTranslator::new(replace(1, 3), 6, HeaderAction::None);
        assert_eq!(translator.column_shift(), 2);
        assert!(!translator.is_identity());
        assert_eq!(translator.translate_text("B1:D1").unwrap(), "B1:F1");

        let identity = RangeTranslator::new(replace(1, 3), 4, HeaderAction::Replace);
        assert!(identity.is_identity());
        assert!(RangeTranslator::new(replace(1, 3), 4, HeaderAction::Insert).is_data_column(4));
    }

    #[test]
    fn test_translate_text_rejects_extra_colons() {
        let translator = RangeTranslator::new(replace(1, 3), 6, HeaderAction::None);
        assert!(translator.translate_text("A1:B2:C3").is_err());
    }

    #[test]
    fn test_translate_tokens_rewrites_formula() {
        let translator = RangeTranslator::new(replace(1, 3), 6, HeaderAction::None);
        let mut tokens = tokenize("=SUM(B1:D1)+E1*\"D1\"").unwrap();
        assert_eq!(translator.translate_tokens(&mut tokens), 2);
        assert_eq!(render(&tokens), "=SUM(B1:F1)+G1*\"D1\"");
    }
}
