use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parse A1-style cell notation (e.g., "A1", "Z99", "AA1")
/// Returns (row, column) as 0-based indices
pub fn parse_a1(notation: &str) -> Result<(u32, u32)> {
    if notation.is_empty() {
        return Err(IngestError::InvalidCellNotation(notation.to_string()));
    }

    let notation = notation.to_uppercase();
    let split_pos = notation
        .bytes()
        .position(|b| b.is_ascii_digit())
        .unwrap_or(0);

    if split_pos == 0 {
        return Err(IngestError::InvalidCellNotation(notation));
    }

    let (col_part, row_part) = notation.split_at(split_pos);
    let col = parse_column_letters(col_part)?;
    let row = row_part
        .parse::<u32>()
        .map_err(|_| IngestError::InvalidCellNotation(notation.clone()))?;

    if row == 0 {
        return Err(IngestError::InvalidCellNotation(notation));
    }

    Ok((row - 1, col))
}

/// Convert column letters to 0-based column index
/// A=0, B=1, ... Z=25, AA=26, AB=27, ...
pub fn parse_column_letters(col_str: &str) -> Result<u32> {
    if col_str.is_empty() || col_str.len() > 3 {
        return Err(IngestError::InvalidCellNotation(col_str.to_string()));
    }

    let mut col: u32 = 0;
    for b in col_str.bytes() {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return Err(IngestError::InvalidCellNotation(col_str.to_string()));
        }
        col = col * 26 + u32::from(b - b'A') + 1;
    }

    Ok(col - 1)
}

/// Convert 0-based column index to column letters
/// 0=A, 1=B, ... 25=Z, 26=AA, 27=AB, ...
pub fn column_index_to_letters(col: u32) -> String {
    let mut result = Vec::new();
    let mut col = col + 1;

    while col > 0 {
        col -= 1;
        result.push((col % 26) as u8 + b'A');
        col /= 26;
    }

    result.iter().rev().map(|&b| b as char).collect()
}

/// Convert (row, col) to A1 notation
/// (0, 0) = "A1", (0, 1) = "B1", etc.
pub fn to_a1_notation(row: u32, col: u32) -> String {
    format!("{}{}", column_index_to_letters(col), row + 1)
}

/// A rectangular block of cells, inclusive on both corners, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRange {
    start: (u32, u32),
    end: (u32, u32),
}

impl CellRange {
    /// Create a range from two (row, col) corners in any order
    #[must_use]
    pub fn new(a: (u32, u32), b: (u32, u32)) -> Self {
        CellRange {
            start: (a.0.min(b.0), a.1.min(b.1)),
            end: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    #[must_use]
    pub fn start(&self) -> (u32, u32) {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> (u32, u32) {
        self.end
    }

    #[must_use]
    pub fn first_row(&self) -> u32 {
        self.start.0
    }

    #[must_use]
    pub fn last_row(&self) -> u32 {
        self.end.0
    }

    #[must_use]
    pub fn first_col(&self) -> u32 {
        self.start.1
    }

    #[must_use]
    pub fn last_col(&self) -> u32 {
        self.end.1
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.end.0 - self.start.0 + 1
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.end.1 - self.start.1 + 1
    }

    /// Check whether a (row, col) position lies inside the range
    #[must_use]
    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start.0..=self.end.0).contains(&row) && (self.start.1..=self.end.1).contains(&col)
    }
}

impl FromStr for CellRange {
    type Err = IngestError;

    /// Parse "A1:C3"; a lone cell ("B2") is a one-cell range
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => Ok(CellRange::new(parse_a1(start)?, parse_a1(end)?)),
            None => {
                let cell = parse_a1(s)?;
                Ok(CellRange::new(cell, cell))
            }
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            to_a1_notation(self.start.0, self.start.1),
            to_a1_notation(self.end.0, self.end.1)
        )
    }
}

impl TryFrom<String> for CellRange {
    type Error = IngestError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CellRange> for String {
    fn from(range: CellRange) -> Self {
        range.to_string()
    }
}
