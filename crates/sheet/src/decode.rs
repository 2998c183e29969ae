//! Workbook decoding
//!
//! Binary containers (xlsx/xlsm/xlsb/ods zips and legacy xls compound files)
//! go through calamine. Plain UTF-8 text is read as a one-sheet CSV workbook.

use crate::a1_notation::CellRange;
use crate::cell::CellValue;
use crate::error::{IngestError, Result};
use crate::extract::ExtractOptions;
use crate::workbook::{Sheet, Workbook};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, SheetType};
use std::io::Cursor;
use tracing::debug;

/// Sheet name given to delimited-text uploads
pub const TEXT_SHEET_NAME: &str = "Sheet1";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &str = "\u{feff}";

/// What the leading bytes say the upload is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Zip or compound-file spreadsheet container
    Spreadsheet,
    /// Delimited text
    Text,
    Unknown,
}

/// Classify a buffer by its signature
pub fn sniff(bytes: &[u8]) -> ContentKind {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(ZIP_EMPTY_MAGIC) || bytes.starts_with(CFB_MAGIC)
    {
        ContentKind::Spreadsheet
    } else if !bytes.contains(&0) && std::str::from_utf8(bytes).is_ok() {
        ContentKind::Text
    } else {
        ContentKind::Unknown
    }
}

/// Decode an in-memory upload into a workbook
///
/// Date cells keep their raw serial value; nothing is reinterpreted.
///
/// # Errors
///
/// Unrecognized or malformed content, a sheet that fails to load, and a
/// sheet name declared twice are returned as [`IngestError::Parse`].
pub fn decode_workbook(bytes: Vec<u8>) -> Result<Workbook> {
    decode(bytes, None)
}

/// Decode only the cells extraction can reach under `options`
///
/// Each sheet's used range is clamped to the scan cap, so cells beyond
/// column/row limits are never copied. The cells kept and the last used row
/// (up to the cap) are the same as with [`decode_workbook`], so extraction
/// gives identical rows.
pub fn decode_workbook_within(bytes: Vec<u8>, options: &ExtractOptions) -> Result<Workbook> {
    decode(bytes, Some(options.scan_range()))
}

fn decode(bytes: Vec<u8>, cap: Option<CellRange>) -> Result<Workbook> {
    if bytes.is_empty() {
        return Err(IngestError::parse("file is empty"));
    }

    match sniff(&bytes) {
        ContentKind::Spreadsheet => decode_spreadsheet(bytes, cap),
        ContentKind::Text => {
            // sniff already validated the encoding
            let text = String::from_utf8(bytes).map_err(IngestError::parse)?;
            decode_text(&text, cap)
        }
        ContentKind::Unknown => Err(IngestError::parse("unrecognized workbook format")),
    }
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::empty(),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        // Serial day number (days since 1899-12-30), left uncoerced
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Pull a position into the cap; `cap` is always anchored at A1
fn clamp_to(pos: (u32, u32), cap: Option<CellRange>) -> (u32, u32) {
    match cap {
        Some(cap) => (pos.0.min(cap.last_row()), pos.1.min(cap.last_col())),
        None => pos,
    }
}

fn sheet_from_range(name: &str, range: &Range<Data>, cap: Option<CellRange>) -> Sheet {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return Sheet::empty(name);
    };
    let (start, end) = (clamp_to(start, cap), clamp_to(end, cap));

    let rows: Vec<Vec<CellValue>> = (start.0..=end.0)
        .map(|row| {
            (start.1..=end.1)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map_or_else(CellValue::empty, data_to_cell_value)
                })
                .collect()
        })
        .collect();

    Sheet::from_rows_at(name, start, rows)
}

fn decode_spreadsheet(bytes: Vec<u8>, cap: Option<CellRange>) -> Result<Workbook> {
    let mut sheets = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(IngestError::parse)?;

    let entries: Vec<(String, bool)> = sheets
        .sheets_metadata()
        .iter()
        .map(|s| (s.name.clone(), matches!(s.typ, SheetType::WorkSheet)))
        .collect();

    let mut workbook = Workbook::new();
    for (name, is_worksheet) in entries {
        // Chart and dialog sheets have no cell grid
        let sheet = if is_worksheet {
            let range = sheets
                .worksheet_range(&name)
                .map_err(|e| IngestError::Parse(format!("sheet '{name}': {e}")))?;
            sheet_from_range(&name, &range, cap)
        } else {
            Sheet::empty(&name)
        };

        debug!(
            sheet = %name,
            used_range = ?sheet.used_range().map(|r| r.to_string()),
            "decoded sheet"
        );
        workbook
            .add_sheet(sheet)
            .map_err(|_| IngestError::Parse(format!("duplicate sheet name '{name}'")))?;
    }

    Ok(workbook)
}

fn decode_text(text: &str, cap: Option<CellRange>) -> Result<Workbook> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false) // Header row is picked by the extractor
        .flexible(true)
        .from_reader(text.as_bytes());

    let (max_rows, max_cols) = cap.map_or((usize::MAX, usize::MAX), |cap| {
        (cap.last_row() as usize + 1, cap.last_col() as usize + 1)
    });

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records().take(max_rows) {
        let record = record.map_err(IngestError::parse)?;
        rows.push(record.iter().take(max_cols).map(CellValue::infer).collect());
    }

    let mut workbook = Workbook::new();
    workbook.add_sheet(Sheet::from_rows(TEXT_SHEET_NAME, rows))?;
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff() {
        assert_eq!(sniff(b"PK\x03\x04rest"), ContentKind::Spreadsheet);
        assert_eq!(sniff(CFB_MAGIC), ContentKind::Spreadsheet);
        assert_eq!(sniff(b"a,b\n1,2\n"), ContentKind::Text);
        assert_eq!(sniff(&[0xFF, 0xFE, 0x00, 0x41]), ContentKind::Unknown);
        assert_eq!(sniff(b"text\0with nul"), ContentKind::Unknown);
    }

    #[test]
    fn test_empty_buffer_is_parse_error() {
        let err = decode_workbook(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse file: file is empty");
    }

    #[test]
    fn test_unknown_bytes_are_parse_error() {
        let err = decode_workbook(vec![0x00, 0x9F, 0x92, 0x96, 0xFF]).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
        assert_eq!(err.to_string(), "Failed to parse file: unrecognized workbook format");
    }

    #[test]
    fn test_truncated_zip_is_parse_error() {
        let err = decode_workbook(b"PK\x03\x04this is not really a zip".to_vec()).unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
        assert!(err.to_string().starts_with("Failed to parse file: "));
    }

    #[test]
    fn test_decode_csv_text() {
        let csv = "\u{feff}Policy,Premium,Active\nPOL-1,1200.5,true\nPOL-2,,FALSE\n";
        let book = decode_workbook(csv.as_bytes().to_vec()).unwrap();

        assert_eq!(book.sheet_names(), vec![TEXT_SHEET_NAME]);
        let sheet = book.get_sheet(TEXT_SHEET_NAME).unwrap();
        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:C3");
        assert_eq!(sheet.cell(0, 0), Some(&CellValue::from("Policy")));
        assert_eq!(sheet.cell(1, 1), Some(&CellValue::Number(1200.5)));
        assert_eq!(sheet.cell(1, 2), Some(&CellValue::Bool(true)));
        assert_eq!(sheet.cell(2, 1), Some(&CellValue::empty()));
    }

    #[test]
    fn test_decode_ragged_csv() {
        let book = decode_workbook(b"a,b,c\n1\n1,2,3,4\n".to_vec()).unwrap();
        let sheet = book.get_sheet(TEXT_SHEET_NAME).unwrap();
        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:D3");
    }

    #[test]
    fn test_csv_is_cropped_to_cap() {
        let options = ExtractOptions {
            last_column: 1,
            last_row: 2,
            ..Default::default()
        };
        let book = decode_workbook_within(b"a,b,c\n1,2,3\n4,5,6\n7,8,9\n".to_vec(), &options)
            .unwrap();
        let sheet = book.get_sheet(TEXT_SHEET_NAME).unwrap();

        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:B3");
        assert_eq!(sheet.cell(2, 1), Some(&CellValue::Number(5.0)));
        assert_eq!(sheet.cell(0, 2), None);
    }

    #[test]
    fn test_range_is_cropped_to_cap() {
        let mut range: Range<Data> = Range::new((0, 0), (6_999, 99));
        range.set_value((0, 0), Data::String("Id".to_string()));
        range.set_value((1, 38), Data::Float(1.5));
        range.set_value((6_999, 99), Data::String("stray".to_string()));

        let cap = ExtractOptions::default().scan_range();
        let sheet = sheet_from_range("Data", &range, Some(cap));
        assert_eq!(sheet.used_range().unwrap().to_string(), "A1:AM6000");
        assert_eq!(sheet.cell(0, 0), Some(&CellValue::from("Id")));
        assert_eq!(sheet.cell(1, 38), Some(&CellValue::Number(1.5)));
        assert_eq!(sheet.cell(6_999, 99), None);

        let full = sheet_from_range("Data", &range, None);
        assert_eq!(full.used_range().unwrap().to_string(), "A1:CV7000");
        assert_eq!(full.cell(6_999, 99), Some(&CellValue::from("stray")));
    }

    #[test]
    fn test_range_past_cap_keeps_capped_last_row() {
        let mut range: Range<Data> = Range::new((7_000, 50), (7_001, 51));
        range.set_value((7_000, 50), Data::String("far".to_string()));

        let cap = ExtractOptions::default().scan_range();
        let sheet = sheet_from_range("Far", &range, Some(cap));
        assert_eq!(sheet.used_range().unwrap().to_string(), "AM6000:AM6000");
        assert_eq!(sheet.cell(5_999, 38), Some(&CellValue::empty()));
    }

    #[test]
    fn test_data_conversion_keeps_raw_values() {
        assert_eq!(data_to_cell_value(&Data::Empty), CellValue::empty());
        assert_eq!(data_to_cell_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            data_to_cell_value(&Data::DateTimeIso("2024-01-31".to_string())),
            CellValue::from("2024-01-31")
        );
        assert_eq!(
            data_to_cell_value(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::from("#DIV/0!")
        );
    }
}
