//! Change notification for lists and maps.
//!
//! Listeners are plain closures registered with `subscribe`. Delivery is synchronous: a listener
//! runs on the mutating call, after the mutation has been applied, in registration order.
//! Listeners must not mutate the container that is notifying them.

use std::{fmt, sync::Arc};

use crate::{list::ValueList, value::Value};

/// What happened to a list or map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Cleared,
    Added,
    Removed,
    Changed,
    Reordered,
}

/// Why a save was requested.
///
/// Auto-saves carry the kind of change that triggered them; explicit `save()` calls use
/// [`SaveMotive::UserInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveMotive {
    Cleared,
    Added,
    Removed,
    Changed,
    Reordered,
    UserInput,
}

impl From<ChangeKind> for SaveMotive {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Cleared => SaveMotive::Cleared,
            ChangeKind::Added => SaveMotive::Added,
            ChangeKind::Removed => SaveMotive::Removed,
            ChangeKind::Changed => SaveMotive::Changed,
            ChangeKind::Reordered => SaveMotive::Reordered,
        }
    }
}

/// A change to a single [`ValueList`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListChange {
    pub kind: ChangeKind,
    /// The value added, removed, moved to the front, or written by an index assignment.
    pub value: Option<Value>,
    /// The value overwritten by an index assignment.
    pub old_value: Option<Value>,
}

impl ListChange {
    pub(crate) fn new(kind: ChangeKind, value: Value) -> Self {
        Self {
            kind,
            value: Some(value),
            old_value: None,
        }
    }

    pub(crate) fn changed(value: Value, old_value: Value) -> Self {
        Self {
            kind: ChangeKind::Changed,
            value: Some(value),
            old_value: Some(old_value),
        }
    }

    pub(crate) fn cleared() -> Self {
        Self {
            kind: ChangeKind::Cleared,
            value: None,
            old_value: None,
        }
    }
}

/// Payload of a [`MapChange`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeValue {
    /// A single element, for changes re-raised from an owned list.
    Item(Value),
    /// A whole list, for map-level add, replace and remove.
    List(ValueList),
}

/// A change to an [`AttributeMap`](crate::AttributeMap).
#[derive(Debug, Clone, PartialEq)]
pub struct MapChange {
    pub kind: ChangeKind,
    /// The normalized key, absent only for [`ChangeKind::Cleared`] on the whole map.
    pub key: Option<String>,
    pub value: Option<ChangeValue>,
    pub old_value: Option<ChangeValue>,
}

impl MapChange {
    pub(crate) fn from_list(key: &str, change: &ListChange) -> Self {
        Self {
            kind: change.kind,
            key: Some(key.to_string()),
            value: change.value.clone().map(ChangeValue::Item),
            old_value: change.old_value.clone().map(ChangeValue::Item),
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// A registered change listener.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Ordered set of listeners for one event type.
pub(crate) struct Listeners<E> {
    next_id: u64,
    entries: Vec<(ListenerId, Listener<E>)>,
}

impl<E> Listeners<E> {
    pub(crate) const fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    /// Copy of the current listeners, so they can be called without holding a lock.
    pub(crate) fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub(crate) fn emit(&self, event: &E) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
