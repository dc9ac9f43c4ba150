//! Rectangular cell grids.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows in an Excel worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Columns in an Excel worksheet (`A` to `XFD`).
pub const MAX_COLUMNS: u32 = 16_384;

/// Value of a single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    /// No value
    #[default]
    Empty,
    /// Text
    String(String),
    /// Numeric value (dates stay as serial numbers)
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Check if the cell has no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// One-letter type code used in serialized markup.
    pub fn type_code(&self) -> char {
        match self {
            CellValue::Empty => 'z',
            CellValue::String(_) => 's',
            CellValue::Number(_) => 'n',
            CellValue::Bool(_) => 'b',
            CellValue::Error(_) => 'e',
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// Format a number the way a spreadsheet shows a general-format value.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A row of cells.
pub type Row = Vec<CellValue>;

/// A rectangular grid of rows.
///
/// Every row has the same number of cells; shorter rows are padded with
/// [`CellValue::Empty`] on construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Row>,
    width: usize,
}

impl Grid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows, padding them to the widest row.
    pub fn from_rows(mut rows: Vec<Row>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self { rows, width }
    }

    /// Build a grid of text cells.
    pub fn from_strings<S: Into<String>>(rows: Vec<Vec<S>>) -> Self {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| CellValue::String(s.into())).collect())
                .collect(),
        )
    }

    /// All rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.width
    }

    /// Check if the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a cell by zero-based coordinates.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Consume the grid and return its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// Zero-based cell coordinates decoded from an A1-style reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// Zero-based row index
    pub row: u32,
    /// Zero-based column index
    pub col: u32,
}

impl CellRef {
    /// Create a reference from zero-based coordinates.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference such as `AB12` (`$` markers allowed).
    ///
    /// References past `XFD1048576` are rejected.
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || Error::InvalidCellReference(reference.to_string());
        let cleaned: String = reference.chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            let value = (c.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(value))
                .ok_or_else(invalid)?;
        }
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROWS || col > MAX_COLUMNS {
            return Err(invalid());
        }

        Ok(Self::new(row - 1, col - 1))
    }

    /// Parse a range such as `A1:C10`; a single reference is a 1x1 range.
    pub fn parse_range(range: &str) -> Result<(Self, Self)> {
        match range.split_once(':') {
            Some((start, end)) => Ok((Self::parse(start)?, Self::parse(end)?)),
            None => {
                let single = Self::parse(range)?;
                Ok((single, single))
            }
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// Column letters for a zero-based column index (0 = `A`, 26 = `AA`).
pub fn column_name(col: u32) -> String {
    let mut n = col + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        name.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    name.iter().rev().collect()
}
