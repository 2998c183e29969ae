use crate::a1_notation::CellRange;
use crate::cell::CellValue;
use crate::error::{IngestError, Result};
use indexmap::IndexMap;

/// A named grid of raw cell values
///
/// Cells are stored densely over the used range only; positions are absolute
/// (row 0 / col 0 is A1 no matter where the used range begins).
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    used: Option<CellRange>,
    cells: Vec<CellValue>,
}

impl Sheet {
    /// A sheet with no used range
    #[must_use]
    pub fn empty(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            used: None,
            cells: Vec::new(),
        }
    }

    /// Build a sheet whose first row sits at A1
    #[must_use]
    pub fn from_rows<T: Into<CellValue>>(name: &str, rows: Vec<Vec<T>>) -> Self {
        Self::from_rows_at(name, (0, 0), rows)
    }

    /// Build a sheet from rows whose top-left cell sits at `origin` (row, col)
    ///
    /// Ragged rows are padded with empty cells. No rows, or only zero-length
    /// rows, produce a sheet without a used range.
    #[must_use]
    pub fn from_rows_at<T: Into<CellValue>>(
        name: &str,
        origin: (u32, u32),
        rows: Vec<Vec<T>>,
    ) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Sheet::empty(name);
        }

        let mut cells = Vec::with_capacity(height * width);
        for row in rows {
            let len = row.len();
            cells.extend(row.into_iter().map(Into::into));
            cells.extend(std::iter::repeat_with(CellValue::empty).take(width - len));
        }

        let end = (
            origin.0 + (height as u32 - 1),
            origin.1 + (width as u32 - 1),
        );

        Sheet {
            name: name.to_string(),
            used: Some(CellRange::new(origin, end)),
            cells,
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared extent of populated cells, if any
    #[must_use]
    pub fn used_range(&self) -> Option<CellRange> {
        self.used
    }

    /// Get a cell by absolute (row, col); `None` outside the used range
    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        let used = self.used?;
        if !used.contains(row, col) {
            return None;
        }
        let r = (row - used.first_row()) as usize;
        let c = (col - used.first_col()) as usize;
        self.cells.get(r * used.width() as usize + c)
    }
}

/// A decoded workbook (preserves declared sheet order)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: IndexMap<String, Sheet>,
}

impl Workbook {
    /// Create a new empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet after the existing ones
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<()> {
        if self.sheets.contains_key(sheet.name()) {
            return Err(IngestError::SheetAlreadyExists {
                name: sheet.name().to_string(),
            });
        }
        self.sheets.insert(sheet.name().to_string(), sheet);
        Ok(())
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Check if the workbook has no sheets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get all sheet names in declared order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Get a sheet by name
    #[must_use]
    pub fn get_sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Iterate sheets in declared order
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }
}
