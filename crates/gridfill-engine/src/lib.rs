//! gridfill_engine - A1 references, formula tokens and column bookkeeping.

pub mod engine;
pub mod error;

pub use error::{EngineError, Result};

#[cfg(test)]
mod tests {
    use crate::engine::*;

    #[test]
    fn test_from_str_single_letter_columns() {
        let a1 = CellRef::from_str("A1").unwrap();
        assert_eq!(a1.row, 0);
        assert_eq!(a1.col, 0);

        let z1 = CellRef::from_str("Z1").unwrap();
        assert_eq!(z1.col, 25);
    }

    #[test]
    fn test_from_str_multi_letter_columns() {
        assert_eq!(CellRef::from_str("AA1").unwrap().col, 26);
        assert_eq!(CellRef::from_str("AZ1").unwrap().col, 51);
        assert_eq!(CellRef::from_str("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_from_str_accepts_absolute_markers() {
        assert_eq!(CellRef::from_str("$C$10"), Some(CellRef::new(2, 9)));
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(CellRef::from_str("").is_none());
        assert!(CellRef::from_str("123").is_none());
        assert!(CellRef::from_str("ABC").is_none());
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("A 1").is_none());
    }

    #[test]
    fn test_display_round_trip() {
        for name in ["A1", "Z9", "AA10", "XFD1048576"] {
            assert_eq!(CellRef::from_str(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_sweep_style_pass_over_formula() {
        // replace [B, D], two data columns inserted -> break column D (3), shift -1
        let replace = ReplaceRange::new(1, 3).unwrap();
        let translator = RangeTranslator::new(replace, 3, HeaderAction::None);
        assert_eq!(translator.column_shift(), -1);

        let mut tokens = tokenize("=AVERAGE(B2:D2)-F2").unwrap();
        translator.translate_tokens(&mut tokens);
        assert_eq!(render(&tokens), "=AVERAGE(B2:C2)-E2");
    }
}
