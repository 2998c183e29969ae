//! Spreadsheet ingestion for intake
//!
//! Turns an uploaded workbook into header-keyed rows, one list per sheet,
//! ready for an import review step.
//!
//! # Pipeline
//!
//! 1. [`ImportSource::read_all`] loads the upload into memory.
//! 2. [`decode_workbook_within`] decodes xlsx/xlsm/xlsb/ods/xls containers (or
//!    CSV text) without coercing dates, keeping only cells inside the scan cap.
//! 3. [`extract_sheet`] scans columns A..AM and rows 1..6000 (bounded by the
//!    sheet's used range), keying each row by the header in row 1.
//! 4. [`retain_populated`] drops rows with fewer than two populated cells.
//!
//! # Examples
//!
//! ```
//! use intake_sheet::{extract_workbook, ExtractOptions, Sheet, Workbook};
//!
//! let mut book = Workbook::new();
//! book.add_sheet(Sheet::from_rows("Clients", vec![
//!     vec!["Name", "City"],
//!     vec!["Alice", "NYC"],
//!     vec!["Bob", ""],
//! ])).unwrap();
//!
//! let extraction = extract_workbook(&book, &ExtractOptions::default());
//! assert_eq!(extraction.sheets, vec!["Clients"]);
//! assert_eq!(extraction.rows("Clients").unwrap().len(), 1);
//! ```
//!
//! ## From a file
//!
//! ```no_run
//! use intake_sheet::{ingest, ExtractOptions, ImportSource};
//!
//! let extraction = ingest(ImportSource::path("claims.xlsx"), &ExtractOptions::default()).unwrap();
//! ```

mod a1_notation;
mod cell;
mod decode;
mod error;
mod extract;
mod filter;
mod ingest;
mod source;
mod workbook;

pub use a1_notation::{
    column_index_to_letters, parse_a1, parse_column_letters, to_a1_notation, CellRange,
};
pub use cell::CellValue;
pub use decode::{decode_workbook, decode_workbook_within, sniff, ContentKind, TEXT_SHEET_NAME};
pub use error::{IngestError, Result};
pub use extract::{
    extract_sheet, extract_workbook, header_keys, ExtractOptions, Extraction, Row,
    DEFAULT_MIN_POPULATED, DEFAULT_SCAN_RANGE,
};
pub use filter::{populated_count, retain_populated};
pub use ingest::ingest;
pub use source::ImportSource;
pub use workbook::{Sheet, Workbook};
