use crate::decode::decode_workbook_within;
use crate::error::Result;
use crate::extract::{extract_workbook, ExtractOptions, Extraction};
use crate::source::ImportSource;
use tracing::debug;

/// Run the whole pipeline for one upload: read, decode, extract, filter
///
/// A read failure stops before decoding. Any failure aborts the request;
/// there is no partial result.
pub fn ingest(source: ImportSource, options: &ExtractOptions) -> Result<Extraction> {
    debug!(?source, "reading upload");
    let bytes = source.read_all()?;

    debug!(bytes = bytes.len(), "decoding workbook");
    let workbook = decode_workbook_within(bytes, options)?;

    Ok(extract_workbook(&workbook, options))
}
