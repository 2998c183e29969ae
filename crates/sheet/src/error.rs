use thiserror::Error;

/// Errors that can occur while ingesting a spreadsheet
///
/// The `Display` output of `Read` and `Parse` is the exact message handed back
/// to import callers, so the prefixes are part of the contract.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    Parse(String),

    #[error("Invalid cell notation: {0}")]
    InvalidCellNotation(String),

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },
}

impl IngestError {
    /// Build a parse error from anything displayable
    pub fn parse(detail: impl std::fmt::Display) -> Self {
        IngestError::Parse(detail.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
