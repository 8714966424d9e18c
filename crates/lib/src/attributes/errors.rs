//! Error types for attribute map operations.

use thiserror::Error;

/// Errors that can occur during [`AttributeMap`](super::AttributeMap) operations.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// `add` was called with a key that is already present (case-insensitively).
    #[error("Attribute already exists: {key}")]
    DuplicateKey {
        /// The normalized key
        key: String,
    },
}

impl AttributeError {
    /// Check if this error indicates the key already exists.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, AttributeError::DuplicateKey { .. })
    }
}

impl From<AttributeError> for crate::Error {
    fn from(err: AttributeError) -> Self {
        crate::Error::Attribute(err)
    }
}
