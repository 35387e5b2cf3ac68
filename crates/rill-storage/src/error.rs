//! Storage substrate error types.

use thiserror::Error;

use rill_common::types::FileId;
use rill_common::RillError;

/// Errors raised by a catalog file substrate.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file ID does not name a file in this substrate.
    #[error("not a valid catalog file ID {fid}")]
    InvalidFileId {
        /// The offending file ID.
        fid: FileId,
    },

    /// The handle or iterator has been closed or never was valid.
    #[error("invalid catalog file handle")]
    InvalidHandle,

    /// The file has no free record slots left.
    #[error("catalog file {fid} is full")]
    FileFull {
        /// The full file.
        fid: FileId,
    },

    /// A heap file was accessed through the raw-page interface, or the
    /// other way around.
    #[error("wrong access flavor for catalog file {fid}")]
    WrongFileFlavor {
        /// The offending file ID.
        fid: FileId,
    },

    /// The substrate supports only one raw file (the database meta file).
    #[error("substrate supports only one raw catalog file")]
    TooManyRawFiles,

    /// I/O error from the underlying system.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl From<StorageError> for RillError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io { source } => RillError::Io { source },
            // Substrate failures other than plain I/O indicate a corrupt or
            // misused catalog and are fatal for catalog operations.
            other => RillError::corruption(other.to_string()),
        }
    }
}

/// Result type alias for substrate operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rill_common::error::ErrorCode;

    #[test]
    fn test_display() {
        let err = StorageError::FileFull {
            fid: FileId::new(3),
        };
        assert_eq!(err.to_string(), "catalog file 3 is full");
    }

    #[test]
    fn test_into_rill_error() {
        let err: RillError = StorageError::InvalidHandle.into();
        assert_eq!(err.code(), ErrorCode::CatalogIntegrity);

        let io = StorageError::Io {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk"),
        };
        let err: RillError = io.into();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
