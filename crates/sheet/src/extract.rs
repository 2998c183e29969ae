use crate::a1_notation::CellRange;
use crate::cell::CellValue;
use crate::error::{IngestError, Result};
use crate::filter::retain_populated;
use crate::workbook::{Sheet, Workbook};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Widest window ever scanned: columns A..AM, rows 1..6000
pub const DEFAULT_SCAN_RANGE: &str = "A1:AM6000";

/// Index of column AM, the last column of [`DEFAULT_SCAN_RANGE`]
const DEFAULT_LAST_COLUMN: u32 = 38;

/// Index of row 6000, the last row of [`DEFAULT_SCAN_RANGE`]
const DEFAULT_LAST_ROW: u32 = 5999;

/// Rows with fewer populated cells than this are dropped
pub const DEFAULT_MIN_POPULATED: usize = 2;

/// Key given to header cells that are blank
const EMPTY_HEADER: &str = "__EMPTY";

/// One extracted record, keyed by column header in column order
pub type Row = IndexMap<String, CellValue>;

/// Per-sheet rows plus the declared sheet order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub data: IndexMap<String, Vec<Row>>,
    pub sheets: Vec<String>,
}

impl Extraction {
    /// Total rows kept across all sheets
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    /// Rows for one sheet
    #[must_use]
    pub fn rows(&self, sheet: &str) -> Option<&[Row]> {
        self.data.get(sheet).map(Vec::as_slice)
    }
}

/// Bounds and thresholds applied while walking a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Last scanned column, 0-based
    pub last_column: u32,
    /// Last scanned row, 0-based
    pub last_row: u32,
    /// Minimum non-empty cells for a row to survive
    pub min_populated: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            last_column: DEFAULT_LAST_COLUMN,
            last_row: DEFAULT_LAST_ROW,
            min_populated: DEFAULT_MIN_POPULATED,
        }
    }
}

impl ExtractOptions {
    /// Take the column and row caps from an A1 range anchored at A1
    pub fn from_scan_range(range: &str) -> Result<Self> {
        let range: CellRange = range.parse()?;
        if range.start() != (0, 0) {
            return Err(IngestError::InvalidCellNotation(format!(
                "scan range must start at A1, got {range}"
            )));
        }
        Ok(ExtractOptions {
            last_column: range.last_col(),
            last_row: range.last_row(),
            ..Default::default()
        })
    }

    /// Set the populated-cell threshold
    #[must_use]
    pub fn with_min_populated(mut self, min_populated: usize) -> Self {
        self.min_populated = min_populated;
        self
    }

    /// The hard cap as an A1 range
    #[must_use]
    pub fn scan_range(&self) -> CellRange {
        CellRange::new((0, 0), (self.last_row, self.last_column))
    }

    /// Window scanned for a sheet with the given used range
    ///
    /// Always anchored at A1 and always the full column cap; rows stop at the
    /// sheet's last used row or the row cap, whichever comes first.
    #[must_use]
    pub fn scan_window(&self, used: CellRange) -> CellRange {
        CellRange::new(
            (0, 0),
            (used.last_row().min(self.last_row), self.last_column),
        )
    }
}

/// Turn header cells into unique row keys
///
/// Blank headers become `__EMPTY`, `__EMPTY_1`, ...; a repeated header `X`
/// becomes `X_1`, `X_2`, ... skipping any key already taken.
pub fn header_keys<'a>(cells: impl IntoIterator<Item = Option<&'a CellValue>>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut keys = Vec::new();

    for cell in cells {
        let base = match cell {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => EMPTY_HEADER.to_string(),
        };

        let mut key = base.clone();
        if taken.contains(&key) {
            let counter = counters.entry(base.clone()).or_insert(0);
            loop {
                *counter += 1;
                key = format!("{base}_{counter}");
                if !taken.contains(&key) {
                    break;
                }
            }
        }

        taken.insert(key.clone());
        keys.push(key);
    }

    keys
}

/// Extract header-keyed rows from one sheet, before filtering
///
/// A sheet without a used range yields no rows. Otherwise row 1 of the scan
/// window names the columns and every later line becomes a Row carrying all
/// keys, with missing cells as the empty string.
pub fn extract_sheet(sheet: &Sheet, options: &ExtractOptions) -> Vec<Row> {
    let Some(used) = sheet.used_range() else {
        return Vec::new();
    };

    let window = options.scan_window(used);
    let columns = 0..=window.last_col();
    let headers = header_keys(columns.clone().map(|col| sheet.cell(0, col)));

    (1..=window.last_row())
        .map(|row| {
            columns
                .clone()
                .zip(&headers)
                .map(|(col, key)| (key.clone(), sheet.cell(row, col).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

/// Extract and filter every sheet in declared order
pub fn extract_workbook(workbook: &Workbook, options: &ExtractOptions) -> Extraction {
    let mut extraction = Extraction::default();

    for sheet in workbook.sheets() {
        let mut rows = extract_sheet(sheet, options);
        let scanned = rows.len();
        let dropped = retain_populated(&mut rows, options.min_populated);

        debug!(
            sheet = sheet.name(),
            window = ?sheet.used_range().map(|used| options.scan_window(used).to_string()),
            scanned,
            dropped,
            kept = rows.len(),
            "extracted sheet"
        );

        extraction.sheets.push(sheet.name().to_string());
        extraction.data.insert(sheet.name().to_string(), rows);
    }

    extraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_cells(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_default_options_match_scan_range() {
        let options = ExtractOptions::from_scan_range(DEFAULT_SCAN_RANGE).unwrap();
        assert_eq!(options, ExtractOptions::default());
        assert_eq!(options.scan_range().to_string(), DEFAULT_SCAN_RANGE);
    }

    #[test]
    fn test_scan_range_must_start_at_a1() {
        assert!(ExtractOptions::from_scan_range("B2:AM6000").is_err());
        assert!(ExtractOptions::from_scan_range("not a range").is_err());
    }

    #[test]
    fn test_scan_window_is_bounded() {
        let options = ExtractOptions::default();

        let small: CellRange = "B3:C10".parse().unwrap();
        assert_eq!(options.scan_window(small).to_string(), "A1:AM10");

        let huge: CellRange = "A1:BZ90000".parse().unwrap();
        assert_eq!(options.scan_window(huge).to_string(), "A1:AM6000");
    }

    #[test]
    fn test_header_keys_blank_and_duplicates() {
        let cells = header_cells(&["Name", "", "Name", "", "Name_1", "Name"]);
        let keys = header_keys(cells.iter().map(Some));
        assert_eq!(
            keys,
            vec!["Name", "__EMPTY", "Name_1", "__EMPTY_1", "Name_1_1", "Name_2"]
        );
    }

    #[test]
    fn test_header_keys_missing_cells() {
        let name = CellValue::from("Policy");
        let keys = header_keys(vec![Some(&name), None, None]);
        assert_eq!(keys, vec!["Policy", "__EMPTY", "__EMPTY_1"]);
    }

    #[test]
    fn test_numeric_header_is_stringified() {
        let year = CellValue::Number(2024.0);
        assert_eq!(header_keys(vec![Some(&year)]), vec!["2024"]);
    }

    #[test]
    fn test_extract_sheet_fills_every_key() {
        let options = ExtractOptions {
            last_column: 3,
            ..Default::default()
        };
        let sheet = Sheet::from_rows(
            "Claims",
            vec![
                vec![CellValue::from("Claim"), CellValue::from("Amount")],
                vec![CellValue::from("CL-1"), CellValue::Number(250.0)],
            ],
        );

        let rows = extract_sheet(&sheet, &options);
        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Claim", "Amount", "__EMPTY", "__EMPTY_1"]);
        assert_eq!(rows[0]["Amount"], CellValue::Number(250.0));
        assert_eq!(rows[0]["__EMPTY_1"], CellValue::empty());
    }

    #[test]
    fn test_extract_sheet_offset_used_range_reads_from_a1() {
        let options = ExtractOptions {
            last_column: 2,
            ..Default::default()
        };
        // Used range C2:C3 still scans from A1, so row 1 is a blank header row
        let sheet = Sheet::from_rows_at("Offset", (1, 2), vec![vec!["x"], vec!["y"]]);

        let rows = extract_sheet(&sheet, &options);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["__EMPTY_2"], CellValue::from("x"));
        assert_eq!(rows[1]["__EMPTY_2"], CellValue::from("y"));
    }

    #[test]
    fn test_extract_sheet_caps_rows() {
        let options = ExtractOptions {
            last_column: 1,
            last_row: 3,
            min_populated: 2,
        };
        let rows: Vec<Vec<i32>> = (0..10).map(|i| vec![i, i]).collect();
        let sheet = Sheet::from_rows("Long", rows);

        assert_eq!(extract_sheet(&sheet, &options).len(), 3);
    }

    #[test]
    fn test_extract_sheet_caps_columns() {
        let options = ExtractOptions {
            last_column: 1,
            ..Default::default()
        };
        let sheet = Sheet::from_rows("Wide", vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);

        let rows = extract_sheet(&sheet, &options);
        assert_eq!(rows[0].len(), 2);
        assert!(!rows[0].contains_key("c"));
    }

    #[test]
    fn test_extract_workbook_keeps_order_and_filters() {
        let mut book = Workbook::new();
        book.add_sheet(Sheet::from_rows(
            "Policies",
            vec![vec!["No", "Holder"], vec!["P1", "Ann"], vec!["P2", ""]],
        ))
        .unwrap();
        book.add_sheet(Sheet::empty("Notes")).unwrap();

        let extraction = extract_workbook(&book, &ExtractOptions::default());
        assert_eq!(extraction.sheets, vec!["Policies", "Notes"]);
        assert_eq!(extraction.rows("Policies").unwrap().len(), 1);
        assert_eq!(extraction.rows("Notes").unwrap().len(), 0);
        assert_eq!(extraction.row_count(), 1);
    }
}
