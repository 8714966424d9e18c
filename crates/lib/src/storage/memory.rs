//! In-memory storage, mainly for tests.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use super::{Storage, StorageError, decode_tagged};
use crate::{
    Result,
    attributes::{AttributeMap, lock},
    codec::TaggedDocument,
    events::SaveMotive,
};

/// Keeps the last saved map as a [`TaggedDocument`] in memory.
///
/// Every save records its [`SaveMotive`], which makes the adapter useful for observing
/// auto-save behaviour. Write failures can be simulated with
/// [`MemoryStorage::set_simulate_write_error`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<TaggedDocument>,
    motives: Mutex<Vec<SaveMotive>>,
    failures: Mutex<usize>,
    simulate_write_error: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing document.
    pub fn with_document(document: TaggedDocument) -> Self {
        Self {
            document: Mutex::new(document),
            ..Self::default()
        }
    }

    /// Make every following save fail until turned off again.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// The currently stored document.
    pub fn document(&self) -> TaggedDocument {
        lock(&self.document).clone()
    }

    /// Motives of all successful saves, oldest first.
    pub fn motives(&self) -> Vec<SaveMotive> {
        lock(&self.motives).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.motives).len()
    }

    /// Number of saves rejected by the simulated write error.
    pub fn failed_saves(&self) -> usize {
        *lock(&self.failures)
    }

    fn store(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            *lock(&self.failures) += 1;
            return Err(StorageError::SimulatedFailure {
                operation: "save".to_string(),
            }
            .into());
        }
        *lock(&self.document) = TaggedDocument::encode(map);
        lock(&self.motives).push(motive);
        tracing::trace!(?motive, keys = map.len(), "Stored attributes in memory");
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<AttributeMap> {
        decode_tagged("memory", &lock(&self.document))
    }

    async fn load_async(&self) -> Result<AttributeMap> {
        self.load()
    }

    fn save(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        self.store(map, motive)
    }

    async fn save_async(&self, map: &AttributeMap, motive: SaveMotive) -> Result<()> {
        self.store(map, motive)
    }
}
