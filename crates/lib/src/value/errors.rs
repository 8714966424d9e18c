//! Error types for value conversions.

use thiserror::Error;

use super::Value;

/// Errors that can occur while converting a [`Value`] to a concrete Rust type.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ValueError {
    /// The stored value has no conversion to the requested type.
    #[error("Cannot convert value of type {actual} to {expected}")]
    TypeMismatch {
        /// The requested target type
        expected: String,
        /// The type of the stored value
        actual: String,
    },

    /// A text value could not be parsed into the requested type.
    #[error("Cannot parse {input:?} as {target}: {reason}")]
    Parse {
        /// The requested target type
        target: String,
        /// The text that failed to parse
        input: String,
        /// Parser-reported reason
        reason: String,
    },

    /// An opaque payload could not be encoded or decoded.
    #[error("Opaque payload for {type_name} could not be (de)serialized")]
    OpaquePayload {
        /// Type name recorded with the payload
        type_name: String,
        /// The underlying serde error
        #[source]
        source: serde_json::Error,
    },
}

impl ValueError {
    pub(crate) fn mismatch(expected: &str, actual: &Value) -> Self {
        ValueError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    pub(crate) fn parse(target: &str, input: &str, reason: impl ToString) -> Self {
        ValueError::Parse {
            target: target.to_string(),
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error means the value could not be turned into the requested type.
    ///
    /// Parse failures count: a text value that doesn't parse is a mismatch for the caller.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            ValueError::TypeMismatch { .. }
                | ValueError::Parse { .. }
                | ValueError::OpaquePayload { .. }
        )
    }

    /// The requested target type, for every variant that has one.
    pub fn expected(&self) -> Option<&str> {
        match self {
            ValueError::TypeMismatch { expected, .. } => Some(expected),
            ValueError::Parse { target, .. } => Some(target),
            ValueError::OpaquePayload { .. } => None,
        }
    }
}

impl From<ValueError> for crate::Error {
    fn from(err: ValueError) -> Self {
        crate::Error::Value(err)
    }
}
