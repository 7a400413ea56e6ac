//! CSV data import

use crate::document::CellValue;
use crate::error::Result;
use std::path::Path;

/// A delimited data resource: one row of column labels, then data rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CsvTable {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl CsvTable {
    /// Number of columns, counting the widest row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.labels.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn label(&self, col: usize) -> Option<&str> {
        self.labels.get(col).map(String::as_str)
    }

    /// Values of one column, top to bottom; short rows yield `Empty`.
    pub fn column(&self, col: usize) -> impl Iterator<Item = CellValue> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(col).cloned().unwrap_or(CellValue::Empty))
    }
}

/// Read a CSV file, dropping the first `skip_rows` lines and any line that starts with
/// `comment`. The first remaining record holds the labels.
pub fn read_csv(path: &Path, skip_rows: usize, comment: Option<u8>) -> Result<CsvTable> {
    let content = std::fs::read_to_string(path)?;
    parse_csv(&content, skip_rows, comment)
}

pub(crate) fn parse_csv(content: &str, skip_rows: usize, comment: Option<u8>) -> Result<CsvTable> {
    let body: Vec<&str> = content.lines().skip(skip_rows).collect();
    let body = body.join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .comment(comment)
        .from_reader(body.as_bytes());

    let labels = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_csv_field).collect());
    }

    Ok(CsvTable { labels, rows })
}

/// Parse a CSV field into a cell value
/// - Empty string -> Empty
/// - Valid finite number -> Number (unless it has leading zeros like "007")
/// - Otherwise -> Text
pub(crate) fn parse_csv_field(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }

    // Keep explicit surrounding whitespace (typically from quoted CSV fields).
    let trimmed = field.trim();
    if field != trimmed {
        return CellValue::text(field);
    }

    // "007" stays text, "0" and "0.5" do not
    if trimmed.starts_with('0')
        && trimmed.len() > 1
        && !trimmed.starts_with("0.")
        && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
    {
        return CellValue::text(trimmed);
    }

    // "NaN" and "inf" parse as f64 but have no cell representation
    if let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return CellValue::Number(n);
    }

    match trimmed {
        "TRUE" | "True" | "true" => CellValue::Bool(true),
        "FALSE" | "False" | "false" => CellValue::Bool(false),
        _ => CellValue::text(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_field_types() {
        assert_eq!(parse_csv_field(""), CellValue::Empty);
        assert_eq!(parse_csv_field("42"), CellValue::Number(42.0));
        assert_eq!(parse_csv_field("-1.5e3"), CellValue::Number(-1500.0));
        assert_eq!(parse_csv_field("007"), CellValue::text("007"));
        assert_eq!(parse_csv_field("0.25"), CellValue::Number(0.25));
        assert_eq!(parse_csv_field("true"), CellValue::Bool(true));
        assert_eq!(parse_csv_field("  hello  "), CellValue::text("  hello  "));
        assert_eq!(parse_csv_field("sample"), CellValue::text("sample"));
        assert_eq!(parse_csv_field("NaN"), CellValue::text("NaN"));
        assert_eq!(parse_csv_field("inf"), CellValue::text("inf"));
        assert_eq!(parse_csv_field("-infinity"), CellValue::text("-infinity"));
        assert_eq!(parse_csv_field("=E1"), CellValue::text("=E1"));
    }

    #[test]
    fn test_labels_and_rows() {
        let table = parse_csv("time,signal\n0,1.5\n1,\"2,5\"\n", 0, None).unwrap();
        assert_eq!(table.labels, vec!["time", "signal"]);
        assert_eq!(table.width(), 2);
        assert_eq!(table.label(1), Some("signal"));
        let signal: Vec<CellValue> = table.column(1).collect();
        assert_eq!(signal, vec![CellValue::Number(1.5), CellValue::text("2,5")]);
    }

    #[test]
    fn test_skip_rows_and_comments() {
        let content = "instrument v2\nrun 7\na,b\n# calibration\n1,2\n";
        let table = parse_csv(content, 2, Some(b'#')).unwrap();
        assert_eq!(table.labels, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
    }

    #[test]
    fn test_ragged_rows_pad_with_empty() {
        let table = parse_csv("a,b,c\n1\n1,2,3,4\n", 0, None).unwrap();
        assert_eq!(table.width(), 4);
        let c: Vec<CellValue> = table.column(2).collect();
        assert_eq!(c, vec![CellValue::Empty, CellValue::Number(3.0)]);
        assert_eq!(table.label(3), None);
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        let table = parse_csv("", 0, None).unwrap();
        assert!(table.labels.is_empty());
        assert_eq!(table.width(), 0);
    }
}
