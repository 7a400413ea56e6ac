//! Column selection parsing.
//!
//! Raw selector tokens are classified by trying, in order, a whole-sequence parse as
//! integers, then as spreadsheet column letters, then as comma-separated header
//! label groups. The first attempt that accepts every token wins.

use super::cell_ref::CellRef;
use crate::error::{EngineError, Result};

/// Kind of a column selection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ColumnId {
    /// Columns selected by 0-based index (0 -> A, 1 -> B).
    Index,
    /// Columns selected by header labels, one label per header row.
    Header,
}

/// Columns to copy out of each data resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ColumnSelection {
    Index(Vec<usize>),
    Header(Vec<Vec<String>>),
}

impl ColumnSelection {
    /// Classify raw selector tokens, e.g. `["0", "2"]`, `["A", "C"]` or `["h1,h2", "h3,h4"]`.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<ColumnSelection> {
        if tokens.is_empty() {
            return Err(EngineError::InvalidSelector("empty selection".to_string()));
        }

        if let Some(indices) = parse_integers(tokens)? {
            return Ok(ColumnSelection::Index(indices));
        }

        if let Some(indices) = parse_letters(tokens) {
            return Ok(ColumnSelection::Index(indices));
        }

        parse_header_groups(tokens).map(ColumnSelection::Header)
    }

    /// Build an index selection from already-parsed 0-based indices.
    pub fn from_indices(indices: Vec<usize>) -> Result<ColumnSelection> {
        if indices.is_empty() {
            return Err(EngineError::InvalidSelector("empty selection".to_string()));
        }
        Ok(ColumnSelection::Index(indices))
    }

    pub fn kind(&self) -> ColumnId {
        match self {
            ColumnSelection::Index(_) => ColumnId::Index,
            ColumnSelection::Header(_) => ColumnId::Header,
        }
    }

    /// Number of template columns one data resource fills.
    pub fn len(&self) -> usize {
        match self {
            ColumnSelection::Index(indices) => indices.len(),
            ColumnSelection::Header(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Ok(None)` when some token is not an integer; negative integers are rejected outright.
fn parse_integers<S: AsRef<str>>(tokens: &[S]) -> Result<Option<Vec<usize>>> {
    let mut indices = Vec::with_capacity(tokens.len());
    for token in tokens {
        let token = token.as_ref().trim();
        let Ok(value) = token.parse::<i64>() else {
            return Ok(None);
        };
        let index = usize::try_from(value).map_err(|_| {
            EngineError::InvalidSelector(format!("negative column index `{}`", token))
        })?;
        indices.push(index);
    }
    Ok(Some(indices))
}

fn parse_letters<S: AsRef<str>>(tokens: &[S]) -> Option<Vec<usize>> {
    tokens
        .iter()
        .map(|token| CellRef::letters_to_col(token.as_ref().trim()))
        .collect()
}

fn parse_header_groups<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Vec<String>>> {
    let mut groups = Vec::with_capacity(tokens.len());
    for token in tokens {
        let group: Vec<String> = token
            .as_ref()
            .split(',')
            .map(|label| label.trim().to_string())
            .collect();
        if group.iter().all(|label| label.is_empty()) {
            return Err(EngineError::InvalidSelector(format!(
                "empty header group `{}`",
                token.as_ref()
            )));
        }
        groups.push(group);
    }

    let depth = groups[0].len();
    if let Some(bad) = groups.iter().find(|group| group.len() != depth) {
        return Err(EngineError::InvalidSelector(format!(
            "header groups must all have {} labels, found `{}`",
            depth,
            bad.join(",")
        )));
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer_tokens() {
        let sel = ColumnSelection::parse(&["0", "1", "2"]).unwrap();
        assert_eq!(sel, ColumnSelection::Index(vec![0, 1, 2]));
        assert_eq!(sel.kind(), ColumnId::Index);
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn test_parse_letter_tokens_are_zero_based() {
        let sel = ColumnSelection::parse(&["A", "B"]).unwrap();
        assert_eq!(sel, ColumnSelection::Index(vec![0, 1]));

        let sel = ColumnSelection::parse(&["c", "AA"]).unwrap();
        assert_eq!(sel, ColumnSelection::Index(vec![2, 26]));
    }

    #[test]
    fn test_parse_header_groups() {
        let sel = ColumnSelection::parse(&["h1,h2", "h3,h4"]).unwrap();
        assert_eq!(
            sel,
            ColumnSelection::Header(vec![
                vec!["h1".to_string(), "h2".to_string()],
                vec!["h3".to_string(), "h4".to_string()],
            ])
        );
        assert_eq!(sel.kind(), ColumnId::Header);
    }

    #[test]
    fn test_single_labels_form_one_row_headers() {
        // Not all letters once "Time" is in the mix.
        let sel = ColumnSelection::parse(&["A", "Time"]).unwrap();
        assert_eq!(
            sel,
            ColumnSelection::Header(vec![vec!["A".to_string()], vec!["Time".to_string()]])
        );
    }

    #[test]
    fn test_rejects_inconsistent_group_lengths() {
        let err = ColumnSelection::parse(&["h1,h2", "h3"]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSelector(_)));
    }

    #[test]
    fn test_rejects_empty_input_and_groups() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ColumnSelection::parse(&empty),
            Err(EngineError::InvalidSelector(_))
        ));
        assert!(matches!(
            ColumnSelection::parse(&["h1", " , "]),
            Err(EngineError::InvalidSelector(_))
        ));
        assert!(matches!(
            ColumnSelection::from_indices(Vec::new()),
            Err(EngineError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_rejects_negative_indices() {
        assert!(matches!(
            ColumnSelection::parse(&["0", "-1"]),
            Err(EngineError::InvalidSelector(_))
        ));
    }
}
