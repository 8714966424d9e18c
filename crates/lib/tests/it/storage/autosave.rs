use std::{sync::Arc, time::Duration};

use dynattr::{AttributeMap, SaveMotive, ValueList, storage::MemoryStorage};

use crate::helpers::sample_map;

fn auto_saving(storage: &Arc<MemoryStorage>) -> AttributeMap {
    let mut map = AttributeMap::new().with_storage(storage.clone());
    map.set_auto_save(true);
    map
}

#[tokio::test]
async fn test_burst_of_changes_persists_final_state() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = auto_saving(&storage);

    map.set("a", 1u8);
    map.set("b", 2u8);
    map.set("a", 3u8);
    map.remove("b");
    map.wait_for_auto_save().await;

    // The worker only runs once this task yields, so the whole burst collapses.
    assert_eq!(storage.motives(), vec![SaveMotive::Removed]);
    assert_eq!(AttributeMap::load_from(storage.clone()).unwrap(), map.snapshot());
}

#[tokio::test]
async fn test_each_change_saved_with_its_motive() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = auto_saving(&storage);

    map.set("k", "v");
    map.wait_for_auto_save().await;
    map.entry("k").push("w");
    map.wait_for_auto_save().await;
    map.get_mut("k").unwrap().set_primary(1);
    map.wait_for_auto_save().await;
    map.clear();
    map.wait_for_auto_save().await;

    assert_eq!(
        storage.motives(),
        vec![
            SaveMotive::Added,
            SaveMotive::Added,
            SaveMotive::Reordered,
            SaveMotive::Cleared,
        ]
    );
    assert!(storage.document().is_empty());
}

#[tokio::test]
async fn test_unchanged_set_does_not_save() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = auto_saving(&storage);

    map.set("k", "v");
    map.wait_for_auto_save().await;
    map.set("K", "v");
    map.wait_for_auto_save().await;

    assert_eq!(storage.save_count(), 1);
}

#[tokio::test]
async fn test_list_replaced_through_guard_is_saved() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = auto_saving(&storage);

    map.set("k", "old");
    map.wait_for_auto_save().await;
    *map.entry("k") = ValueList::from("new");
    map.wait_for_auto_save().await;

    assert_eq!(storage.motives(), vec![SaveMotive::Added, SaveMotive::Changed]);
    let persisted = AttributeMap::load_from(storage.clone()).unwrap();
    assert_eq!(persisted.get("k"), map.get("k"));
}

#[tokio::test]
async fn test_nan_reassignment_does_not_save() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = auto_saving(&storage);

    map.set("ratio", f32::NAN);
    map.wait_for_auto_save().await;
    map.set("ratio", f32::NAN);
    map.wait_for_auto_save().await;

    assert_eq!(storage.save_count(), 1);
}

#[tokio::test]
async fn test_auto_save_failure_is_not_surfaced() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set_simulate_write_error(true);
    let mut map = auto_saving(&storage);

    map.set("k", "v");
    map.wait_for_auto_save().await;

    assert_eq!(storage.failed_saves(), 1);
    assert_eq!(map.get("k").len(), 1);

    storage.set_simulate_write_error(false);
    map.set("k", "w");
    map.wait_for_auto_save().await;
    assert_eq!(storage.save_count(), 1);
}

#[tokio::test]
async fn test_disabled_auto_save_never_writes() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = sample_map().with_storage(storage.clone());
    assert!(!map.auto_save());

    map.set("k", "v");
    map.wait_for_auto_save().await;

    assert_eq!(storage.save_count(), 0);
}

#[test]
fn test_auto_save_without_runtime_uses_thread() {
    let storage = Arc::new(MemoryStorage::new());
    let mut map = auto_saving(&storage);

    map.set("k", "v");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    runtime.block_on(async {
        tokio::time::timeout(Duration::from_secs(5), map.wait_for_auto_save())
            .await
            .unwrap();
    });

    assert_eq!(storage.motives(), vec![SaveMotive::Added]);
}
