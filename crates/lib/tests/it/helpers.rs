use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset};
use dynattr::{AttributeMap, ChangeKind, ValueList};

/// Records the kinds of every event a container emits.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<ChangeKind>>>);

impl EventLog {
    pub fn record(&self, kind: ChangeKind) {
        self.0.lock().unwrap().push(kind);
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.0.lock().unwrap().iter().filter(|k| **k == kind).count()
    }

    pub fn total(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn kinds(&self) -> Vec<ChangeKind> {
        self.0.lock().unwrap().clone()
    }
}

/// Subscribe an [`EventLog`] to a map.
pub fn watch_map(map: &mut AttributeMap) -> EventLog {
    let log = EventLog::default();
    let recorder = log.clone();
    map.subscribe(move |change| recorder.record(change.kind));
    log
}

/// Subscribe an [`EventLog`] to a list.
pub fn watch_list(list: &mut ValueList) -> EventLog {
    let log = EventLog::default();
    let recorder = log.clone();
    list.subscribe(move |change| recorder.record(change.kind));
    log
}

pub fn timestamp(text: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(text).unwrap()
}

/// A map with text, integer and timestamp lists.
pub fn sample_map() -> AttributeMap {
    let mut map = AttributeMap::new();
    map.set("Band", "Pink Floyd");
    map.set("members", ["Gilmour", "Waters", "Mason", "Wright"]);
    map.set("albums", [1967i32, 1973, 1979]);
    map.set(
        "released",
        [
            timestamp("1973-03-01T00:00:00+00:00"),
            timestamp("1979-11-30T12:30:00+01:00"),
        ],
    );
    map.set("mixed", ValueList::from_iter([dynattr::Value::from("a"), 2u8.into(), true.into()]));
    map
}
