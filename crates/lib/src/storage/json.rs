//! JSON file storage.
//!
//! The whole map is written as one [`TaggedDocument`](crate::codec::TaggedDocument). Saves go to
//! a temporary file next to the target which is then renamed over it, so readers never see a
//! partial write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::{Storage, StorageError, decode_document, encode_document};
use crate::{Result, attributes::AttributeMap, events::SaveMotive};

/// Persists an [`AttributeMap`] to a single JSON file.
///
/// A missing file loads as an empty map. The parent directory must exist.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    pretty: bool,
}

impl JsonFileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pretty: false,
        }
    }

    /// Indent the written JSON.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{name}-{}.tmp", Uuid::new_v4()))
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> crate::Error {
        StorageError::FileIo {
            path: path.to_path_buf(),
            source,
        }
        .into()
    }

    fn decode(&self, text: Option<String>) -> Result<AttributeMap> {
        match text {
            Some(text) => decode_document(&self.location(), &text),
            None => {
                tracing::debug!(path = %self.path.display(), "No attribute file yet, starting empty");
                Ok(AttributeMap::new())
            }
        }
    }
}

fn missing_is_none(result: std::io::Result<String>) -> std::io::Result<Option<String>> {
    match result {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<AttributeMap> {
        let text = missing_is_none(std::fs::read_to_string(&self.path))
            .map_err(|e| self.io_error(&self.path, e))?;
        self.decode(text)
    }

    async fn load_async(&self) -> Result<AttributeMap> {
        let text = missing_is_none(tokio::fs::read_to_string(&self.path).await)
            .map_err(|e| self.io_error(&self.path, e))?;
        self.decode(text)
    }

    fn save(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        let content = encode_document(map, self.pretty)?;
        let tmp = self.temp_path();
        let written = std::fs::write(&tmp, content)
            .map_err(|e| self.io_error(&tmp, e))
            .and_then(|()| {
                std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))
            });
        if written.is_err() {
            std::fs::remove_file(&tmp).ok();
        }
        written?;
        tracing::debug!(path = %self.path.display(), ?motive, keys = map.len(), "Wrote attribute file");
        Ok(())
    }

    async fn save_async(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        let content = encode_document(map, self.pretty)?;
        let tmp = self.temp_path();
        let written = match tokio::fs::write(&tmp, content).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path)
                .await
                .map_err(|e| self.io_error(&self.path, e)),
            Err(e) => Err(self.io_error(&tmp, e)),
        };
        if written.is_err() {
            tokio::fs::remove_file(&tmp).await.ok();
        }
        written?;
        tracing::debug!(path = %self.path.display(), ?motive, keys = map.len(), "Wrote attribute file");
        Ok(())
    }
}
