//! AttributeMap case-insensitivity and map-level events.

use std::sync::{Arc, Mutex};

use dynattr::{AttributeMap, ChangeKind, Value, ValueList, events::ChangeValue};

use crate::helpers::{sample_map, watch_map};

// ===== Keys =====

#[test]
fn test_keys_ignore_case() {
    let mut map = AttributeMap::new();
    map.set("Name", "Pink Floyd");

    assert_eq!(map.get("name"), map.get("NAME"));
    assert_eq!(map.get("nAmE").cast::<String>().unwrap(), "Pink Floyd");
    assert!(map.contains_key("NAME"));
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn test_absent_key_reads_as_empty_list() {
    let map = AttributeMap::new();
    let list = map.get("missing");

    assert!(list.is_empty());
    assert!(!list.has_value());
    assert_eq!(list.cast::<i64>().unwrap(), 0);
    assert!(!map.contains_key("missing"));
}

#[test]
fn test_add_rejects_existing_key_in_any_case() {
    let mut map = AttributeMap::new();
    map.add("Genre", "Progressive rock").unwrap();

    let err = map.add("GENRE", "Psychedelia").unwrap_err();
    assert!(err.is_duplicate_key());
    assert_eq!(map.get("genre").len(), 1);
}

#[test]
fn test_pink_floyd_walkthrough() {
    let mut map = AttributeMap::new();
    map.set("Band", "Pink Floyd");
    map.entry("Members").extend(["Gilmour", "Waters", "Mason"]);
    map.entry("members").push("Wright");
    map.entry("MEMBERS").insert_primary("Barrett");

    let members = map.get("members");
    assert_eq!(members.len(), 5);
    assert_eq!(members.cast::<String>().unwrap(), "Barrett");

    {
        let mut members = map.get_mut("members").unwrap();
        assert!(members.set_primary_value("Gilmour"));
        assert!(members.remove("Barrett"));
    }

    assert_eq!(
        map.get("members").cast_list::<String>().unwrap(),
        vec!["Gilmour", "Waters", "Mason", "Wright"]
    );
    assert_eq!(map.get("band").to_string(), "Pink Floyd");
    assert!(map.get_mut("drummer").is_none());
}

// ===== Map events =====

#[test]
fn test_distinct_fresh_keys_emit_added() {
    let mut map = AttributeMap::new();
    let log = watch_map(&mut map);

    map.set("a", 1i32);
    map.set("b", 2i32);
    map.set("c", 3i32);

    assert_eq!(log.count(ChangeKind::Added), 3);
    assert_eq!(log.count(ChangeKind::Changed), 0);
}

#[test]
fn test_reassigning_same_value_is_silent() {
    let mut map = AttributeMap::new();
    map.set("k", ["x", "y"]);
    let log = watch_map(&mut map);

    map.set("K", ["x", "y"]);
    map.set("k", ValueList::from(["x", "y"]));

    assert_eq!(log.total(), 0);
}

#[test]
fn test_reassigning_different_value_emits_changed_once() {
    let mut map = AttributeMap::new();
    map.set("k", "old");

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    map.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    map.set("k", "new");

    let changes = changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Changed);
    assert_eq!(changes[0].key.as_deref(), Some("k"));
    assert_eq!(
        changes[0].old_value,
        Some(ChangeValue::List(ValueList::from("old")))
    );
    assert_eq!(
        changes[0].value,
        Some(ChangeValue::List(ValueList::from("new")))
    );
}

#[test]
fn test_reassigning_nan_is_silent() {
    let mut map = AttributeMap::new();
    map.set("ratio", f64::NAN);
    let log = watch_map(&mut map);

    map.set("ratio", f64::NAN);
    assert_eq!(log.total(), 0);

    map.set("ratio", -0.0f64);
    map.set("ratio", 0.0f64);
    assert_eq!(log.count(ChangeKind::Changed), 2);
}

#[test]
fn test_remove_present_and_absent() {
    let mut map = sample_map();
    let log = watch_map(&mut map);

    assert!(map.remove("BAND"));
    assert_eq!(log.count(ChangeKind::Removed), 1);

    assert!(!map.remove("band"));
    assert_eq!(log.total(), 1);
}

#[test]
fn test_clear_emits_single_event() {
    let mut map = sample_map();
    assert!(map.len() > 1);
    let log = watch_map(&mut map);

    map.clear();

    assert_eq!(log.kinds(), vec![ChangeKind::Cleared]);
    assert!(map.is_empty());
}

// ===== Owned lists =====

#[test]
fn test_list_changes_are_reraised_with_key() {
    let mut map = AttributeMap::new();
    map.set("Tags", "a");

    let keys = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&keys);
    map.subscribe(move |change| {
        sink.lock()
            .unwrap()
            .push((change.kind, change.key.clone(), change.value.clone()))
    });

    map.entry("TAGS").push("b");
    map.get_mut("tags").unwrap().set_primary(1);

    let keys = keys.lock().unwrap();
    assert_eq!(
        *keys,
        vec![
            (
                ChangeKind::Added,
                Some("tags".to_string()),
                Some(ChangeValue::Item(Value::from("b")))
            ),
            (
                ChangeKind::Reordered,
                Some("tags".to_string()),
                Some(ChangeValue::Item(Value::from("b")))
            ),
        ]
    );
}

#[test]
fn test_replacing_list_through_guard_emits_changed() {
    let mut map = AttributeMap::new();
    map.set("k", "old");

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    map.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

    *map.entry("K") = ValueList::from("new");

    {
        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Changed);
        assert_eq!(changes[0].key.as_deref(), Some("k"));
        assert_eq!(
            changes[0].old_value,
            Some(ChangeValue::List(ValueList::from("old")))
        );
        assert_eq!(
            changes[0].value,
            Some(ChangeValue::List(ValueList::from("new")))
        );
    }

    // The replacement is owned by the map from now on.
    map.entry("k").push("more");
    assert_eq!(changes.lock().unwrap().len(), 2);
    assert_eq!(map.get("k").len(), 2);
}

#[test]
fn test_replacing_list_with_equal_list_is_silent() {
    let mut map = AttributeMap::new();
    map.set("k", ["a", "b"]);
    let log = watch_map(&mut map);

    *map.get_mut("k").unwrap() = ValueList::from(["a", "b"]);
    assert_eq!(log.total(), 0);

    *map.get_mut("k").unwrap() = ValueList::from(["b", "a"]);
    assert_eq!(log.kinds(), vec![ChangeKind::Changed]);
}

#[test]
fn test_entry_on_new_key_emits_added() {
    let mut map = AttributeMap::new();
    let log = watch_map(&mut map);

    map.entry("fresh");
    assert_eq!(log.kinds(), vec![ChangeKind::Added]);
    assert!(map.contains_key("fresh"));
    assert!(map.get("fresh").is_empty());

    map.entry("fresh").push(1u8);
    assert_eq!(log.count(ChangeKind::Added), 2);
}

#[test]
fn test_removed_list_no_longer_reports() {
    let mut map = AttributeMap::new();
    map.set("k", "v");
    let log = watch_map(&mut map);

    map.remove("k");
    map.set("k", "w");
    map.entry("k").push("x");

    assert_eq!(
        log.kinds(),
        vec![ChangeKind::Removed, ChangeKind::Added, ChangeKind::Added]
    );
}

#[test]
fn test_snapshot_is_detached() {
    let mut map = sample_map();
    let log = watch_map(&mut map);

    let mut copy = map.snapshot();
    copy.set("band", "Other");
    copy.entry("members").clear();

    assert_eq!(log.total(), 0);
    assert_eq!(map.get("band").cast::<String>().unwrap(), "Pink Floyd");
    assert_eq!(map.get("members").len(), 4);
}

#[test]
fn test_collect_into_map_is_silent_and_last_wins() {
    let map: AttributeMap = [("A", "first"), ("a", "second"), ("b", "third")]
        .into_iter()
        .collect();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("a").cast::<String>().unwrap(), "second");
}
