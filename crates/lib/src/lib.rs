//!
//! dynattr: a case-insensitive, multi-valued attribute store.
//!
//! Every key maps to an ordered list of heterogeneous values. The first element of a list is its
//! *primary* value, the one used when the attribute is read in a singular context.
//!
//! ## Core Concepts
//!
//! * **Values (`value::Value`)**: A closed variant over the supported element kinds (booleans,
//!   text, integer and float families, decimals, timestamps, durations, UUIDs, characters) plus an
//!   opaque serde-backed escape hatch. All conversion rules live in the `value` module.
//! * **Lists (`list::ValueList`)**: An ordered container of values with a primary value, typed
//!   casts and synchronous change notification.
//! * **Maps (`attributes::AttributeMap`)**: Case-insensitive key to `ValueList` storage. It
//!   re-raises list events with the owning key and can persist itself after every change.
//! * **Storage (`storage::Storage`)**: The pluggable load/save boundary. In-memory, JSON file and
//!   SQLite (feature `sqlite`) adapters are provided.
//! * **Codec (`codec`)**: The tagged, order-preserving encoding every adapter persists.
//!
//! ## Example
//!
//! ```
//! use dynattr::{AttributeMap, ValueList};
//!
//! let mut map = AttributeMap::new();
//! map.set("Band", "Pink Floyd");
//! map.set("album", ["The Wall", "Animals"]);
//!
//! assert_eq!(map.get("band").cast::<String>().unwrap(), "Pink Floyd");
//! assert_eq!(map.get("ALBUM").len(), 2);
//! assert!(map.get("missing").is_empty());
//! ```

pub mod attributes;
pub mod codec;
pub mod events;
pub mod list;
pub mod storage;
pub mod value;

pub use attributes::{AttributeMap, ListGuard};
pub use events::{ChangeKind, ListChange, MapChange, SaveMotive};
pub use list::ValueList;
pub use storage::{Storage, StorageConfig};
pub use value::{FromValue, Value, ValueKind};

/// Result type used throughout the dynattr library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the dynattr library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured conversion errors from the value module
    #[error(transparent)]
    Value(value::ValueError),

    /// Structured list errors from the list module
    #[error(transparent)]
    List(list::ListError),

    /// Structured map errors from the attributes module
    #[error(transparent)]
    Attribute(attributes::AttributeError),

    /// Structured encoding errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured persistence errors from the storage module
    #[error(transparent)]
    Storage(storage::StorageError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Value(_) => "value",
            Error::List(_) => "list",
            Error::Attribute(_) => "attributes",
            Error::Codec(_) => "codec",
            Error::Storage(_) => "storage",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error means a value could not be converted to the requested type.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::Value(value_err) => value_err.is_type_mismatch(),
            _ => false,
        }
    }

    /// Check if this error is an out-of-range index.
    pub fn is_index_out_of_range(&self) -> bool {
        match self {
            Error::List(list_err) => list_err.is_index_out_of_range(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (key already exists).
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            Error::Attribute(attr_err) => attr_err.is_duplicate_key(),
            _ => false,
        }
    }

    /// Check if this error came from a storage adapter or from persisted data.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Codec(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Storage(storage_err) => storage_err.is_io_error(),
            _ => false,
        }
    }
}
