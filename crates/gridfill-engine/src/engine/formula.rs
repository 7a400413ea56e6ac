//! Formula tokenization.
//!
//! Cell text is split into tokens so reference operands can be rewritten without
//! touching anything else in the formula:
//!
//! - **Literal**: the whole text of a cell that is not a formula
//! - **Operand**: numbers, strings, booleans, error literals and defined names
//! - **Operator**: operators, function openers, parentheses, separators, whitespace
//! - **Range**: a cell or range reference, decoded into column/row boundaries
//!
//! `render(&tokenize(text)?)` reproduces `text` exactly as long as no range was changed.

use std::fmt;
use std::str::FromStr;

use super::cell_ref::RefEndpoint;
use crate::error::{EngineError, Result};

/// Error literals recognised at the start of an operand.
const ERROR_LITERALS: [&str; 8] = [
    "#NULL!",
    "#DIV/0!",
    "#VALUE!",
    "#REF!",
    "#NAME?",
    "#NUM!",
    "#N/A",
    "#GETTING_DATA",
];

/// One token of a cell's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaToken {
    Literal(String),
    Operand(String),
    Operator(String),
    Range(RangeOperand),
}

impl FormulaToken {
    pub fn text(&self) -> &str {
        match self {
            FormulaToken::Literal(s) | FormulaToken::Operand(s) | FormulaToken::Operator(s) => s,
            FormulaToken::Range(range) => range.text(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, FormulaToken::Literal(_))
    }
}

/// Decoded 0-based boundaries of a range operand. Whole-row ranges have no columns and
/// whole-column ranges have no rows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Boundaries {
    pub col_start: Option<usize>,
    pub row_start: Option<usize>,
    pub col_end: Option<usize>,
    pub row_end: Option<usize>,
}

/// A reference operand: `B2`, `$B$2:D9`, `Sheet1!C:C`, `'Q1 Data'!3:4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeOperand {
    text: String,
    sheet: Option<String>,
    start: RefEndpoint,
    end: Option<RefEndpoint>,
}

impl RangeOperand {
    /// Decode `text` as a reference.
    ///
    /// Returns `Ok(None)` when the text is some other operand (a defined name, a
    /// structured reference) and `MalformedRange` when it has the shape of a range
    /// but not one or two endpoints.
    pub fn parse(text: &str) -> Result<Option<RangeOperand>> {
        let (sheet, reference) = split_sheet(text);
        let parts: Vec<&str> = reference.split(':').collect();
        if parts.len() > 2 || (parts.len() == 2 && parts.iter().any(|p| p.is_empty())) {
            return Err(EngineError::MalformedRange(text.to_string()));
        }

        let Some(start) = RefEndpoint::parse(parts[0]) else {
            return Ok(None);
        };
        let end = match parts.get(1) {
            Some(part) => match RefEndpoint::parse(part) {
                Some(end) => Some(end),
                None => return Ok(None),
            },
            None => None,
        };

        let consistent = match &end {
            None => start.is_cell(),
            Some(end) => {
                (start.is_cell() && end.is_cell())
                    || (start.is_column() && end.is_column())
                    || (start.is_row() && end.is_row())
            }
        };
        if !consistent {
            return Ok(None);
        }

        Ok(Some(RangeOperand {
            text: text.to_string(),
            sheet: sheet.map(str::to_string),
            start,
            end,
        }))
    }

    /// Text of the operand as it appears in the formula.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sheet qualifier exactly as written, without the `!`.
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn start(&self) -> RefEndpoint {
        self.start
    }

    pub fn end(&self) -> Option<RefEndpoint> {
        self.end
    }

    /// True for a single-cell operand such as `B2`.
    pub fn is_single(&self) -> bool {
        self.end.is_none()
    }

    pub fn boundaries(&self) -> Boundaries {
        let end = self.end.unwrap_or(self.start);
        Boundaries {
            col_start: self.start.col.map(|c| c.index),
            row_start: self.start.row.map(|r| r.index),
            col_end: end.col.map(|c| c.index),
            row_end: end.row.map(|r| r.index),
        }
    }

    /// Same sheet qualifier, new endpoints. The text is only re-rendered when an endpoint
    /// actually changed, so untouched operands keep their original spelling.
    pub fn with_endpoints(&self, start: RefEndpoint, end: Option<RefEndpoint>) -> RangeOperand {
        if start == self.start && end == self.end {
            return self.clone();
        }
        let mut range = RangeOperand {
            text: String::new(),
            sheet: self.sheet.clone(),
            start,
            end,
        };
        range.text = range.render();
        range
    }

    /// The operand after its target was deleted: `#REF!`, keeping any sheet qualifier.
    pub fn ref_error(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("{}!#REF!", sheet),
            None => "#REF!".to_string(),
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(sheet) = &self.sheet {
            out.push_str(sheet);
            out.push('!');
        }
        out.push_str(&self.start.to_string());
        if let Some(end) = &self.end {
            out.push(':');
            out.push_str(&end.to_string());
        }
        out
    }
}

impl FromStr for RangeOperand {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        RangeOperand::parse(s)?.ok_or_else(|| EngineError::MalformedRange(s.to_string()))
    }
}

impl fmt::Display for RangeOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Split `Sheet1!A1:B2` at the last `!` outside single quotes.
fn split_sheet(text: &str) -> (Option<&str>, &str) {
    let mut in_quotes = false;
    let mut split_at = None;
    for (idx, ch) in text.char_indices() {
        match ch {
            '\'' => in_quotes = !in_quotes,
            '!' if !in_quotes => split_at = Some(idx),
            _ => {}
        }
    }
    match split_at {
        Some(idx) => (Some(&text[..idx]), &text[idx + 1..]),
        None => (None, text),
    }
}

/// Split cell text into tokens.
///
/// Empty text has no tokens; text not starting with `=` is a single [`FormulaToken::Literal`].
pub fn tokenize(text: &str) -> Result<Vec<FormulaToken>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = text.strip_prefix('=') else {
        return Ok(vec![FormulaToken::Literal(text.to_string())]);
    };
    Tokenizer::new(body).run()
}

/// Whether cell text is a formula: `=` followed by at least one character.
pub fn is_formula(text: &str) -> bool {
    text.len() > 1 && text.starts_with('=')
}

/// Join tokens back into cell text.
pub fn render(tokens: &[FormulaToken]) -> String {
    let body: String = tokens.iter().map(FormulaToken::text).collect();
    match tokens.first() {
        Some(FormulaToken::Literal(_)) => body,
        _ => format!("={}", body),
    }
}

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    current: String,
    tokens: Vec<FormulaToken>,
}

impl Tokenizer {
    fn new(body: &str) -> Self {
        Tokenizer {
            chars: body.chars().collect(),
            pos: 0,
            current: String::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<FormulaToken>> {
        while let Some(&ch) = self.chars.get(self.pos) {
            match ch {
                '"' => {
                    self.flush()?;
                    let text = self.take_quoted('"');
                    self.tokens.push(FormulaToken::Operand(text));
                }
                '\'' => {
                    let text = self.take_quoted('\'');
                    self.current.push_str(&text);
                }
                '[' => {
                    let text = self.take_bracketed();
                    self.current.push_str(&text);
                }
                '#' if self.current.is_empty() => {
                    if let Some(literal) = self.error_literal_here() {
                        self.pos += literal.chars().count();
                        self.tokens.push(FormulaToken::Operand(literal.to_string()));
                    } else {
                        self.current.push(ch);
                        self.pos += 1;
                    }
                }
                ' ' | '\t' | '\r' | '\n' => {
                    self.flush()?;
                    let start = self.pos;
                    while self
                        .chars
                        .get(self.pos)
                        .is_some_and(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
                    {
                        self.pos += 1;
                    }
                    let text: String = self.chars[start..self.pos].iter().collect();
                    self.tokens.push(FormulaToken::Operator(text));
                }
                '+' | '-' if is_exponent_prefix(&self.current) => {
                    self.current.push(ch);
                    self.pos += 1;
                }
                '<' | '>' => {
                    self.flush()?;
                    let next = self.chars.get(self.pos + 1).copied();
                    let op = match (ch, next) {
                        ('<', Some('=')) | ('>', Some('=')) | ('<', Some('>')) => {
                            format!("{}{}", ch, next.unwrap_or_default())
                        }
                        _ => ch.to_string(),
                    };
                    self.pos += op.chars().count();
                    self.tokens.push(FormulaToken::Operator(op));
                }
                '(' => {
                    let mut opener = std::mem::take(&mut self.current);
                    opener.push('(');
                    self.pos += 1;
                    self.tokens.push(FormulaToken::Operator(opener));
                }
                '+' | '-' | '*' | '/' | '^' | '&' | '=' | '%' | ')' | ',' | ';' | '{' | '}' => {
                    self.flush()?;
                    self.pos += 1;
                    self.tokens.push(FormulaToken::Operator(ch.to_string()));
                }
                _ => {
                    self.current.push(ch);
                    self.pos += 1;
                }
            }
        }
        self.flush()?;
        Ok(self.tokens)
    }

    /// Read a quoted run starting at the opening quote; doubled quotes are escapes.
    /// An unterminated run extends to the end of the formula.
    fn take_quoted(&mut self, quote: char) -> String {
        let start = self.pos;
        self.pos += 1;
        while let Some(&ch) = self.chars.get(self.pos) {
            self.pos += 1;
            if ch == quote {
                if self.chars.get(self.pos) == Some(&quote) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Read a bracketed run (external workbook index, structured reference), nesting aware.
    fn take_bracketed(&mut self) -> String {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(&ch) = self.chars.get(self.pos) {
            self.pos += 1;
            match ch {
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn error_literal_here(&self) -> Option<&'static str> {
        let rest: String = self.chars[self.pos..].iter().take(16).collect();
        let upper = rest.to_ascii_uppercase();
        ERROR_LITERALS
            .iter()
            .copied()
            .find(|literal| upper.starts_with(literal))
    }

    fn flush(&mut self) -> Result<()> {
        if self.current.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.current);
        let token = classify_operand(text)?;
        self.tokens.push(token);
        Ok(())
    }
}

fn classify_operand(text: String) -> Result<FormulaToken> {
    let is_number = text.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && text.parse::<f64>().is_ok();
    if is_number
        || text.eq_ignore_ascii_case("TRUE")
        || text.eq_ignore_ascii_case("FALSE")
    {
        return Ok(FormulaToken::Operand(text));
    }

    match RangeOperand::parse(&text)? {
        Some(range) => Ok(FormulaToken::Range(range)),
        None => Ok(FormulaToken::Operand(text)),
    }
}

/// `1E` / `2.5e` so far: the next `+`/`-` belongs to the exponent.
fn is_exponent_prefix(current: &str) -> bool {
    let Some(mantissa) = current
        .strip_suffix('E')
        .or_else(|| current.strip_suffix('e'))
    else {
        return false;
    };
    !mantissa.is_empty()
        && mantissa.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && mantissa.parse::<f64>().is_ok()
}
