//! SQLite storage for attribute maps.
//!
//! Each key is one row in the `attributes` table, its value the JSON text of the key's
//! [`TaggedList`]. The adapter uses sqlx with an `AnyPool`; all database work is async and the
//! blocking [`Storage`] methods drive it on a runtime.
//!
//! See [`schema`] for the table layout and migrations.

/// Schema definition and migration system.
pub mod schema;

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use sqlx::{AnyPool, any::AnyPoolOptions};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{Storage, StorageError, decode_tagged};
use crate::{
    Result,
    attributes::AttributeMap,
    codec::{TaggedDocument, TaggedList},
    events::SaveMotive,
};

/// Extension trait for sqlx results, converting errors to [`StorageError::SqlxError`] with a
/// context message.
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StorageError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Stores an [`AttributeMap`] in a SQLite database.
///
/// Saves run in one transaction: every key of the map is upserted and rows for keys the map
/// no longer has are deleted.
///
/// # Runtimes
///
/// Adapters created with [`open_blocking`](Self::open_blocking) or
/// [`in_memory_blocking`](Self::in_memory_blocking) own a tokio runtime and can be used from
/// plain threads. Blocking calls made from inside a multi-threaded runtime are run with
/// `block_in_place`; from a current-thread runtime they fail with
/// [`StorageError::RuntimeUnavailable`], use the async methods there.
pub struct SqliteStorage {
    pool: AnyPool,
    location: String,
    runtime: Option<Arc<Runtime>>,
}

impl SqliteStorage {
    /// Open a SQLite database at the given path, creating file and schema if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        // mode=rwc: read-write-create
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect(&url).await
    }

    /// Connect using a SQLite connection URL (e.g. `sqlite:./attrs.db`).
    pub async fn connect(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        // An in-memory database disappears when its last connection closes.
        let is_in_memory = url.contains("mode=memory");
        let options = AnyPoolOptions::new().max_connections(5);
        let options = if is_in_memory {
            options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options
        };
        let pool = options
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        let pragmas = if is_in_memory {
            "PRAGMA busy_timeout = 5000;"
        } else {
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;"
        };
        sqlx::query(pragmas)
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        let storage = Self {
            pool,
            location: url.to_string(),
            runtime: None,
        };
        schema::initialize(&storage).await?;

        tracing::debug!(location = %storage.location, "Opened SQLite attribute storage");
        Ok(storage)
    }

    /// Create a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let unique_id = uuid::Uuid::new_v4();
        Self::connect(&format!(
            "sqlite:file:mem_{unique_id}?mode=memory&cache=shared"
        ))
        .await
    }

    /// Blocking version of [`open`](Self::open). The returned adapter owns its runtime.
    pub fn open_blocking(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        Self::with_owned_runtime(move || Self::open(path))
    }

    /// Blocking version of [`in_memory`](Self::in_memory). The returned adapter owns its
    /// runtime.
    pub fn in_memory_blocking() -> Result<Self> {
        Self::with_owned_runtime(Self::in_memory)
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    fn with_owned_runtime<F, Fut>(make: F) -> Result<Self>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Self>>,
    {
        let build = move || -> Result<Self> {
            let rt = Arc::new(Runtime::new().map_err(|e| StorageError::SqlxError {
                reason: format!("Failed to create tokio runtime: {e}"),
                source: None,
            })?);
            let mut storage = rt.block_on(make())?;
            storage.runtime = Some(rt);
            Ok(storage)
        };

        if Handle::try_current().is_err() {
            return build();
        }

        // A runtime cannot be created from within another one.
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            tx.send(build()).ok();
        });
        rx.recv().unwrap_or_else(|_| {
            Err(StorageError::RuntimeUnavailable {
                operation: "open".to_string(),
            }
            .into())
        })
    }

    fn block_on<F: Future<Output = Result<T>>, T>(&self, operation: &str, fut: F) -> Result<T> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(fut))
            }
            Ok(_) => Err(StorageError::RuntimeUnavailable {
                operation: operation.to_string(),
            }
            .into()),
            Err(_) => match &self.runtime {
                Some(rt) => rt.block_on(fut),
                None => Err(StorageError::RuntimeUnavailable {
                    operation: operation.to_string(),
                }
                .into()),
            },
        }
    }

    async fn load_rows(&self) -> Result<AttributeMap> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM attributes")
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to load attributes")?;

        let document = rows
            .into_iter()
            .map(|(key, value)| -> Result<(String, TaggedList)> {
                let list: TaggedList = serde_json::from_str(&value).map_err(|e| {
                    StorageError::DeserializationFailed {
                        location: format!("{}#{key}", self.location),
                        source: e,
                    }
                })?;
                Ok((key, list))
            })
            .collect::<Result<TaggedDocument>>()?;
        decode_tagged(&self.location, &document)
    }

    async fn store_rows(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        let document = TaggedDocument::encode(map);
        let rows = document
            .iter()
            .map(|(key, list)| {
                serde_json::to_string(list)
                    .map(|value| (key.to_string(), value))
                    .map_err(|e| StorageError::SerializationFailed { source: e })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        for (key, value) in &rows {
            sqlx::query(
                "INSERT INTO attributes (key, value) VALUES ($1, $2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key.as_str())
            .bind(value.as_str())
            .execute(&mut *tx)
            .await
            .sql_context(&format!("Failed to store attribute {key}"))?;
        }

        let stored: Vec<(String,)> = sqlx::query_as("SELECT key FROM attributes")
            .fetch_all(&mut *tx)
            .await
            .sql_context("Failed to list stored attributes")?;
        for (key,) in stored {
            if document.get(&key).is_none() {
                sqlx::query("DELETE FROM attributes WHERE key = $1")
                    .bind(key.as_str())
                    .execute(&mut *tx)
                    .await
                    .sql_context(&format!("Failed to delete attribute {key}"))?;
            }
        }

        tx.commit()
            .await
            .sql_context("Failed to commit transaction")?;

        tracing::debug!(location = %self.location, ?motive, keys = rows.len(), "Saved attributes to SQLite");
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("location", &self.location)
            .field("owns_runtime", &self.runtime.is_some())
            .finish()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn load(&self) -> Result<AttributeMap> {
        self.block_on("load", self.load_rows())
    }

    async fn load_async(&self) -> Result<AttributeMap> {
        self.load_rows().await
    }

    fn save(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        self.block_on("save", self.store_rows(map, motive))
    }

    async fn save_async(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        self.store_rows(map, motive).await
    }
}

impl Drop for SqliteStorage {
    fn drop(&mut self) {
        // Dropping a runtime inside another one panics.
        if let Some(runtime) = self.runtime.take() {
            if Handle::try_current().is_ok() {
                std::thread::spawn(move || drop(runtime));
            } else {
                drop(runtime);
            }
        }
    }
}
