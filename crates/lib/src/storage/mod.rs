//! Storage adapters for [`AttributeMap`].
//!
//! The [`Storage`] trait is the only thing the map knows about persistence. Implementations
//! must preserve, per key, the element order and the kind of every element; the provided
//! adapters all do so by persisting the [`codec`](crate::codec) representation.
//!
//! ## Available Adapters
//!
//! - [`MemoryStorage`]: keeps the encoded document in memory, records save motives
//! - [`JsonFileStorage`]: one JSON document on disk, replaced atomically on save
//! - [`SqliteStorage`] (feature: `sqlite`): one row per key in a SQLite table

mod errors;
mod json;
mod memory;
#[cfg(feature = "sqlite")]
pub mod sql;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use errors::StorageError;
pub use json::JsonFileStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use sql::SqliteStorage;

use crate::{Result, attributes::AttributeMap, codec::TaggedDocument, events::SaveMotive};

/// The load/save boundary used by [`AttributeMap`].
///
/// Saves must be idempotent: saving the same map state twice yields equivalent persisted data.
/// `motive` tells the adapter why the save happened; adapters may ignore it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Where the data lives (a path or URL), for logs and diagnostics.
    fn location(&self) -> String;

    fn load(&self) -> Result<AttributeMap>;

    async fn load_async(&self) -> Result<AttributeMap>;

    fn save(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()>;

    async fn save_async(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()>;
}

/// Declarative choice of storage adapter, e.g. from a configuration file.
///
/// ```
/// # use dynattr::StorageConfig;
/// let config: StorageConfig =
///     serde_json::from_str(r#"{ "backend": "json", "path": "attrs.json" }"#).unwrap();
/// assert_eq!(config.location(), "attrs.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local, nothing is written to disk
    Memory,
    /// A JSON document at `path`
    Json {
        path: PathBuf,
        #[serde(default)]
        pretty: bool,
    },
    /// A SQLite database at `path`
    #[cfg(feature = "sqlite")]
    Sqlite { path: PathBuf },
}

impl StorageConfig {
    pub fn location(&self) -> String {
        match self {
            StorageConfig::Memory => "memory".to_string(),
            StorageConfig::Json { path, .. } => path.display().to_string(),
            #[cfg(feature = "sqlite")]
            StorageConfig::Sqlite { path } => path.display().to_string(),
        }
    }

    /// Open the configured adapter.
    ///
    /// Works outside of a tokio runtime; a SQLite adapter opened this way owns its runtime.
    pub fn open(&self) -> Result<Arc<dyn Storage>> {
        let storage: Arc<dyn Storage> = match self {
            StorageConfig::Memory => Arc::new(MemoryStorage::new()),
            StorageConfig::Json { path, pretty } => {
                Arc::new(JsonFileStorage::new(path).pretty(*pretty))
            }
            #[cfg(feature = "sqlite")]
            StorageConfig::Sqlite { path } => Arc::new(SqliteStorage::open_blocking(path)?),
        };
        Ok(storage)
    }

    /// Open the configured adapter from within a tokio runtime.
    pub async fn open_async(&self) -> Result<Arc<dyn Storage>> {
        match self {
            #[cfg(feature = "sqlite")]
            StorageConfig::Sqlite { path } => Ok(Arc::new(SqliteStorage::open(path).await?)),
            _ => self.open(),
        }
    }
}

/// Encode a map as JSON text.
pub(crate) fn encode_document(map: &AttributeMap, pretty: bool) -> Result<String> {
    let document = TaggedDocument::encode(map);
    let text = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    };
    text.map_err(|e| StorageError::SerializationFailed { source: e }.into())
}

/// Decode JSON text produced by [`encode_document`].
pub(crate) fn decode_document(location: &str, text: &str) -> Result<AttributeMap> {
    let document: TaggedDocument =
        serde_json::from_str(text).map_err(|e| StorageError::DeserializationFailed {
            location: location.to_string(),
            source: e,
        })?;
    decode_tagged(location, &document)
}

pub(crate) fn decode_tagged(location: &str, document: &TaggedDocument) -> Result<AttributeMap> {
    document.decode().map_err(|e| {
        StorageError::MalformedData {
            location: location.to_string(),
            source: e,
        }
        .into()
    })
}
