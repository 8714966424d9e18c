//! Case-insensitive attribute map.
//!
//! [`AttributeMap`] maps keys to [`ValueList`]s. Keys are normalized to lowercase on every
//! operation, so `"Name"`, `"name"` and `"NAME"` address the same list. Reading an absent key is
//! never an error; it yields an empty list.
//!
//! # Events
//!
//! Map-level operations (`set`, `add`, `remove`, `clear`, and `entry` on a new key) emit a
//! [`MapChange`]. Changes made to an owned list through a [`ListGuard`] are re-raised as
//! `MapChange`s carrying the owning key. Delivery is synchronous and ordered.
//!
//! # Persistence
//!
//! A map can hold a [`Storage`] adapter. [`AttributeMap::save`] writes explicitly. With
//! auto-save enabled, every change also queues a background save of a snapshot of the whole map,
//! motivated by the kind of change. Auto-saves are single-flight: see the `autosave` module.
//!
//! # Concurrency
//!
//! Mutation goes through `&mut self`; share a map across threads behind your own lock.

mod autosave;
mod errors;

use std::{
    collections::HashMap,
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

pub use errors::AttributeError;

use self::autosave::{AutoSaver, SaveRequest};
use crate::{
    Result,
    events::{ChangeKind, ChangeValue, ListChange, ListenerId, Listeners, MapChange, SaveMotive},
    list::ValueList,
    storage::Storage,
};

/// Returned by [`AttributeMap::get`] for absent keys.
static EMPTY: ValueList = ValueList::new();

/// Lock a mutex, recovering the data if a listener panicked while it was held.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

/// State shared between a map and the change hooks of the lists it owns.
#[derive(Default)]
struct Shared {
    listeners: Mutex<Listeners<MapChange>>,
    /// Motive of the latest list change not yet turned into an auto-save.
    pending: Mutex<Option<SaveMotive>>,
}

impl Shared {
    fn emit(&self, change: &MapChange) {
        let listeners = lock(&self.listeners).snapshot();
        for listener in listeners {
            listener(change);
        }
    }

    fn forward(&self, key: &str, change: &ListChange) {
        tracing::trace!(key, kind = ?change.kind, "List change");
        self.emit(&MapChange::from_list(key, change));
        *lock(&self.pending) = Some(change.kind.into());
    }

    fn take_pending(&self) -> Option<SaveMotive> {
        lock(&self.pending).take()
    }
}

/// A case-insensitive map from attribute name to [`ValueList`].
///
/// ```
/// use dynattr::{AttributeMap, Value};
///
/// let mut map = AttributeMap::new();
/// map.set("Name", "Pink Floyd");
///
/// // Lists are created on first reference and mutated through a guard.
/// map.entry("alias").push("The Pink Floyd Sound");
/// map.entry("ALIAS").insert_primary("Pink Floyd");
///
/// assert_eq!(map.get("name").primary(), Some(&Value::from("Pink Floyd")));
/// assert_eq!(map.get("alias").len(), 2);
/// assert!(map.add("NAME", "duplicate").unwrap_err().is_duplicate_key());
/// ```
pub struct AttributeMap {
    entries: HashMap<String, ValueList>,
    shared: Arc<Shared>,
    storage: Option<Arc<dyn Storage>>,
    auto_save: bool,
    saver: Arc<AutoSaver>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            shared: Arc::default(),
            storage: None,
            auto_save: false,
            saver: Arc::default(),
        }
    }

    /// Attach a storage adapter.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Load a map from `storage` and keep the adapter attached for later saves.
    pub fn load_from(storage: Arc<dyn Storage>) -> Result<Self> {
        let map = storage.load()?;
        tracing::debug!(location = %storage.location(), keys = map.len(), "Loaded attributes");
        Ok(map.with_storage(storage))
    }

    /// Async form of [`AttributeMap::load_from`].
    pub async fn load_from_async(storage: Arc<dyn Storage>) -> Result<Self> {
        let map = storage.load_async().await?;
        tracing::debug!(location = %storage.location(), keys = map.len(), "Loaded attributes");
        Ok(map.with_storage(storage))
    }

    pub fn set_storage(&mut self, storage: Option<Arc<dyn Storage>>) {
        self.storage = storage;
    }

    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// Enable or disable saving after every change. Has no effect without storage.
    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    // ===== Reading =====

    /// The list stored under `key`, or an empty list if the key is absent.
    pub fn get(&self, key: &str) -> &ValueList {
        self.entries.get(&normalize(key)).unwrap_or(&EMPTY)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &ValueList> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueList)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Detached copy of the entries, without storage, auto-save or listeners.
    pub fn snapshot(&self) -> AttributeMap {
        self.iter().map(|(k, v)| (k, v.clone())).collect()
    }

    // ===== Mutation =====

    /// Mutable access to the list under `key`, if present.
    pub fn get_mut(&mut self, key: &str) -> Option<ListGuard<'_>> {
        let key = normalize(key);
        let list = self.entries.remove(&key)?;
        Some(ListGuard {
            map: self,
            original: list.clone(),
            key,
            list,
        })
    }

    /// Mutable access to the list under `key`, creating an empty one if absent.
    ///
    /// Creating the list emits `Added`.
    pub fn entry(&mut self, key: &str) -> ListGuard<'_> {
        let key = normalize(key);
        let list = match self.entries.remove(&key) {
            Some(list) => list,
            None => {
                tracing::debug!(key = %key, "Attribute created");
                self.shared.emit(&MapChange {
                    kind: ChangeKind::Added,
                    key: Some(key.clone()),
                    value: Some(ChangeValue::List(ValueList::new())),
                    old_value: None,
                });
                // The entry is out of the map until the guard drops, so the save waits for it.
                *lock(&self.shared.pending) = Some(SaveMotive::Added);
                self.adopt(&key, ValueList::new())
            }
        };
        ListGuard {
            map: self,
            original: list.clone(),
            key,
            list,
        }
    }

    /// Store `value` under `key`.
    ///
    /// An absent key behaves like [`AttributeMap::add`]. A present key has its list replaced;
    /// `Changed` is emitted only when the new list differs from the old one element-wise.
    pub fn set(&mut self, key: &str, value: impl Into<ValueList>) {
        let key = normalize(key);
        let list = self.adopt(&key, value.into());
        let current = list.clone();
        match self.entries.insert(key.clone(), list) {
            Some(mut previous) => {
                previous.detach_owner();
                if !previous.is_identical(&current) {
                    tracing::debug!(key = %key, "Attribute replaced");
                    self.notify(MapChange {
                        kind: ChangeKind::Changed,
                        key: Some(key),
                        value: Some(ChangeValue::List(current)),
                        old_value: Some(ChangeValue::List(previous)),
                    });
                }
            }
            None => self.added(key, current),
        }
    }

    /// Store `value` under a new key, failing with `DuplicateKey` if it already exists.
    pub fn add(&mut self, key: &str, value: impl Into<ValueList>) -> Result<()> {
        let key = normalize(key);
        if self.entries.contains_key(&key) {
            return Err(AttributeError::DuplicateKey { key }.into());
        }
        let list = self.adopt(&key, value.into());
        let current = list.clone();
        self.entries.insert(key.clone(), list);
        self.added(key, current);
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let key = normalize(key);
        let Some(mut removed) = self.entries.remove(&key) else {
            return false;
        };
        removed.detach_owner();
        tracing::debug!(key = %key, "Attribute removed");
        self.notify(MapChange {
            kind: ChangeKind::Removed,
            key: Some(key),
            value: Some(ChangeValue::List(removed)),
            old_value: None,
        });
        true
    }

    /// Remove every entry, emitting a single `Cleared` event.
    pub fn clear(&mut self) {
        tracing::debug!(keys = self.entries.len(), "Attributes cleared");
        self.entries.clear();
        self.notify(MapChange {
            kind: ChangeKind::Cleared,
            key: None,
            value: None,
            old_value: None,
        });
    }

    // ===== Listeners =====

    /// Registers a listener for changes to this map and every list it owns.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&MapChange) + Send + Sync + 'static,
    {
        lock(&self.shared.listeners).subscribe(Arc::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        lock(&self.shared.listeners).unsubscribe(id)
    }

    // ===== Persistence =====

    /// Save through the attached storage with motive `UserInput`.
    ///
    /// Returns `Ok(false)` when no storage is attached.
    pub fn save(&self) -> Result<bool> {
        let Some(storage) = &self.storage else {
            return Ok(false);
        };
        tracing::debug!(location = %storage.location(), keys = self.len(), "Saving attributes");
        storage.save(self, SaveMotive::UserInput)?;
        Ok(true)
    }

    /// Async form of [`AttributeMap::save`].
    pub async fn save_async(&self) -> Result<bool> {
        let Some(storage) = &self.storage else {
            return Ok(false);
        };
        tracing::debug!(location = %storage.location(), keys = self.len(), "Saving attributes");
        storage.save_async(self, SaveMotive::UserInput).await?;
        Ok(true)
    }

    /// Wait until no auto-save is queued or in flight.
    pub async fn wait_for_auto_save(&self) {
        self.saver.wait_idle().await;
    }

    // ===== Internals =====

    /// Route the list's changes through this map under `key`.
    fn adopt(&self, key: &str, mut list: ValueList) -> ValueList {
        let shared = Arc::clone(&self.shared);
        let key = key.to_string();
        list.attach_owner(Arc::new(move |change: &ListChange| {
            shared.forward(&key, change)
        }));
        list
    }

    fn added(&self, key: String, list: ValueList) {
        tracing::debug!(key = %key, "Attribute added");
        self.notify(MapChange {
            kind: ChangeKind::Added,
            key: Some(key),
            value: Some(ChangeValue::List(list)),
            old_value: None,
        });
    }

    fn notify(&self, change: MapChange) {
        self.shared.emit(&change);
        self.schedule_auto_save(change.kind.into());
    }

    fn schedule_auto_save(&self, motive: SaveMotive) {
        if !self.auto_save {
            return;
        }
        let Some(storage) = &self.storage else {
            return;
        };
        tracing::trace!(?motive, "Scheduling auto-save");
        self.saver.schedule(SaveRequest {
            map: self.snapshot(),
            motive,
            storage: Arc::clone(storage),
        });
    }
}

impl Default for AttributeMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Same as [`AttributeMap::snapshot`].
impl Clone for AttributeMap {
    fn clone(&self) -> Self {
        self.snapshot()
    }
}

impl PartialEq for AttributeMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeMap")
            .field("entries", &self.entries)
            .field("storage", &self.storage.as_ref().map(|s| s.location()))
            .field("auto_save", &self.auto_save)
            .finish()
    }
}

/// Builds a map without emitting events. Later duplicates (case-insensitively) win.
impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: AsRef<str>,
    V: Into<ValueList>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (key, value) in iter {
            let key = normalize(key.as_ref());
            let list = map.adopt(&key, value.into());
            map.entries.insert(key, list);
        }
        map
    }
}

/// Mutable handle to one list of an [`AttributeMap`].
///
/// Changes made through the guard are re-raised by the map as they happen. If auto-save is
/// enabled, the resulting save is queued when the guard drops.
///
/// Replacing the list wholesale (`*guard = list`) raises no list events; when the guard drops,
/// the map emits `Changed` for the key if the new list differs from the one the guard started
/// with, as [`AttributeMap::set`] would.
pub struct ListGuard<'a> {
    map: &'a mut AttributeMap,
    key: String,
    list: ValueList,
    /// The list as it was when the guard was created.
    original: ValueList,
}

impl ListGuard<'_> {
    /// The normalized key of this list.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Deref for ListGuard<'_> {
    type Target = ValueList;

    fn deref(&self) -> &ValueList {
        &self.list
    }
}

impl DerefMut for ListGuard<'_> {
    fn deref_mut(&mut self) -> &mut ValueList {
        &mut self.list
    }
}

impl Drop for ListGuard<'_> {
    fn drop(&mut self) {
        let key = std::mem::take(&mut self.key);
        // A list assigned through `DerefMut` was never adopted.
        let replaced = !self.list.has_owner();
        let list = self.map.adopt(&key, std::mem::take(&mut self.list));
        let current = replaced.then(|| list.clone());
        self.map.entries.insert(key.clone(), list);
        let pending = self.map.shared.take_pending();

        match current {
            Some(current) if !current.is_identical(&self.original) => {
                tracing::debug!(key = %key, "Attribute replaced through guard");
                let original = std::mem::take(&mut self.original);
                self.map.notify(MapChange {
                    kind: ChangeKind::Changed,
                    key: Some(key),
                    value: Some(ChangeValue::List(current)),
                    old_value: Some(ChangeValue::List(original)),
                });
            }
            _ => {
                if let Some(motive) = pending {
                    self.map.schedule_auto_save(motive);
                }
            }
        }
    }
}
