use std::sync::Arc;

use dynattr::{
    AttributeMap, SaveMotive, Storage, StorageConfig,
    storage::MemoryStorage,
};

use super::assert_same_contents;
use crate::helpers::sample_map;

#[test]
fn test_memory_round_trip() {
    let storage = Arc::new(MemoryStorage::new());
    let map = sample_map().with_storage(storage.clone());

    assert!(map.save().unwrap());

    let loaded = AttributeMap::load_from(storage.clone()).unwrap();
    assert_same_contents(&map, &loaded);
    assert_eq!(storage.motives(), vec![SaveMotive::UserInput]);
    assert!(loaded.storage().is_some());
}

#[test]
fn test_save_without_storage_is_a_no_op() {
    let map = sample_map();
    assert!(!map.save().unwrap());
}

#[test]
fn test_save_failure_is_returned() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_simulate_write_error(true);
    let map = sample_map().with_storage(storage.clone());

    let err = map.save().unwrap_err();
    assert!(err.is_storage_error());
    assert_eq!(err.module(), "storage");
    assert_eq!(storage.failed_saves(), 1);
}

#[test]
fn test_saves_are_idempotent() {
    let storage = MemoryStorage::new();
    let map = sample_map();

    storage.save(&map, SaveMotive::UserInput).unwrap();
    let first = storage.document();
    storage.save(&map, SaveMotive::UserInput).unwrap();

    assert_eq!(first, storage.document());
}

#[test]
fn test_open_from_config() {
    let config: StorageConfig = serde_json::from_str(r#"{ "backend": "memory" }"#).unwrap();
    let storage = config.open().unwrap();

    let mut map = AttributeMap::new();
    map.set("k", 1u64);
    storage.save(&map, SaveMotive::UserInput).unwrap();
    assert_eq!(storage.load().unwrap(), map);
}
