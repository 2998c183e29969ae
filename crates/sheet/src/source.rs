use crate::error::Result;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// The file handle an import request is made with
///
/// Content is loaded whole; no size limit is applied here.
pub enum ImportSource {
    /// A file on disk
    Path(PathBuf),
    /// An upload already held in memory
    Bytes(Vec<u8>),
    /// Any other byte stream
    Stream(Box<dyn Read + Send>),
}

impl ImportSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImportSource::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ImportSource::Bytes(bytes.into())
    }

    pub fn stream<R: Read + Send + 'static>(reader: R) -> Self {
        ImportSource::Stream(Box::new(reader))
    }

    /// Load the whole content into memory
    ///
    /// # Errors
    ///
    /// Any I/O failure is returned as [`IngestError::Read`](crate::IngestError::Read).
    pub fn read_all(self) -> Result<Vec<u8>> {
        match self {
            ImportSource::Path(path) => Ok(std::fs::read(path)?),
            ImportSource::Bytes(bytes) => Ok(bytes),
            ImportSource::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl fmt::Debug for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImportSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ImportSource::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<PathBuf> for ImportSource {
    fn from(path: PathBuf) -> Self {
        ImportSource::Path(path)
    }
}

impl From<Vec<u8>> for ImportSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImportSource::Bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use std::io;

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            // Interrupted would be retried by read_to_end
            Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
        }
    }

    #[test]
    fn test_read_bytes() {
        let data = ImportSource::bytes(vec![1, 2, 3]).read_all().unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_read_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, b"payload").unwrap();

        let data = ImportSource::path(&path).read_all().unwrap();
        assert_eq!(data, b"payload");
    }

    #[test]
    fn test_missing_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImportSource::path(dir.path().join("missing.xlsx"))
            .read_all()
            .unwrap_err();
        assert!(matches!(err, IngestError::Read(_)));
        assert!(err.to_string().starts_with("Failed to read file: "));
    }

    #[test]
    fn test_stream_failure_is_read_error() {
        let err = ImportSource::stream(BrokenReader).read_all().unwrap_err();
        assert_eq!(err.to_string(), "Failed to read file: device unplugged");
    }

    #[test]
    fn test_debug_hides_content() {
        assert_eq!(format!("{:?}", ImportSource::bytes(vec![0; 4])), "Bytes(4 bytes)");
    }
}
