//! Error types for list operations.

use thiserror::Error;

/// Errors that can occur during [`ValueList`](super::ValueList) operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// Index-based access beyond the current length.
    #[error("Index {index} is out of range for a list of length {len}")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// The list length at the time of the call
        len: usize,
    },
}

impl ListError {
    /// Check if this error is an out-of-range index.
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, ListError::IndexOutOfRange { .. })
    }
}

impl From<ListError> for crate::Error {
    fn from(err: ListError) -> Self {
        crate::Error::List(err)
    }
}
