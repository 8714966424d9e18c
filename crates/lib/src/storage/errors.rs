//! Error types for storage adapters.

use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecError;

/// Errors reported by [`Storage`](super::Storage) implementations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// File I/O error.
    #[error("File I/O error on {}", path.display())]
    FileIo {
        /// The file being read or written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Persisted data is not valid JSON.
    #[error("Deserialization failed for {location}")]
    DeserializationFailed {
        /// Where the data came from
        location: String,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// Persisted data is valid JSON but not a valid tagged document.
    #[error("Malformed data in {location}")]
    MalformedData {
        /// Where the data came from
        location: String,
        /// What failed to decode
        #[source]
        source: CodecError,
    },

    /// Database operation failed.
    #[cfg(feature = "sqlite")]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of the failure
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },

    /// A blocking call was made where no runtime can drive it.
    #[error("No runtime available for blocking {operation}")]
    RuntimeUnavailable {
        /// The operation that was attempted
        operation: String,
    },

    /// Failure injected by [`MemoryStorage`](super::MemoryStorage) for testing.
    #[error("Simulated {operation} failure")]
    SimulatedFailure {
        /// The operation that was failed on purpose
        operation: String,
    },
}

impl StorageError {
    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(self, StorageError::FileIo { .. })
    }

    /// Check if persisted data could not be read back.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            StorageError::DeserializationFailed { .. } | StorageError::MalformedData { .. }
        )
    }

    /// Check if this error came from the database driver.
    pub fn is_database_error(&self) -> bool {
        #[cfg(feature = "sqlite")]
        if matches!(self, StorageError::SqlxError { .. }) {
            return true;
        }
        false
    }
}

impl From<StorageError> for crate::Error {
    fn from(err: StorageError) -> Self {
        crate::Error::Storage(err)
    }
}
