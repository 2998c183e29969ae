use intake_sheet::{Extraction, ImportSource, IngestError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one import request; echoed in its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One file handed to the worker
#[derive(Debug)]
pub struct ImportRequest {
    pub id: RequestId,
    pub source: ImportSource,
}

impl ImportRequest {
    pub fn new(source: ImportSource) -> Self {
        ImportRequest {
            id: RequestId::new(),
            source,
        }
    }
}

/// The single outcome of an import
///
/// Serializes as `{ "data": {...}, "sheets": [...] }` or `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportResponse {
    Success(Extraction),
    Failure { error: String },
}

impl ImportResponse {
    /// Failure reply for `err`
    ///
    /// Only read errors keep the `Failed to read file:` prefix; every other
    /// variant is reported as a parse failure.
    pub fn failure(err: &IngestError) -> Self {
        let error = match err {
            IngestError::Read(_) | IngestError::Parse(_) => err.to_string(),
            other => IngestError::parse(other).to_string(),
        };
        ImportResponse::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImportResponse::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ImportResponse::Failure { error } => Some(error),
            ImportResponse::Success(_) => None,
        }
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        match self {
            ImportResponse::Success(extraction) => Some(extraction),
            ImportResponse::Failure { .. } => None,
        }
    }
}

impl From<Result<Extraction, IngestError>> for ImportResponse {
    fn from(result: Result<Extraction, IngestError>) -> Self {
        match result {
            Ok(extraction) => ImportResponse::Success(extraction),
            Err(err) => ImportResponse::failure(&err),
        }
    }
}

/// A response tagged with the request it answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReply {
    pub id: RequestId,
    #[serde(flatten)]
    pub response: ImportResponse,
}
