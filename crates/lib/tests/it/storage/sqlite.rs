use std::sync::Arc;

use dynattr::{AttributeMap, SaveMotive, Storage, StorageConfig, storage::SqliteStorage};
use tempfile::TempDir;

use super::assert_same_contents;
use crate::helpers::sample_map;

#[tokio::test]
async fn test_sqlite_round_trip() {
    let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
    let map = sample_map().with_storage(storage.clone());

    map.save_async().await.unwrap();
    let loaded = AttributeMap::load_from_async(storage).await.unwrap();

    assert_same_contents(&map, &loaded);
}

#[tokio::test]
async fn test_sqlite_one_row_per_key() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    let mut map = sample_map();
    storage.save_async(&map, SaveMotive::UserInput).await.unwrap();

    map.set("band", "Pink Floyd (UK)");
    storage.save_async(&map, SaveMotive::Changed).await.unwrap();

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attributes")
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert_eq!(rows as usize, map.len());

    let (value,): (String,) = sqlx::query_as("SELECT value FROM attributes WHERE key = $1")
        .bind("band")
        .fetch_one(storage.pool())
        .await
        .unwrap();
    assert!(value.contains("Pink Floyd (UK)"));
}

#[test]
fn test_sqlite_file_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("attrs.db");
    let map = sample_map();

    {
        let storage = SqliteStorage::open_blocking(&path).unwrap();
        storage.save(&map, SaveMotive::UserInput).unwrap();
    }

    let config = StorageConfig::Sqlite { path };
    let loaded = AttributeMap::load_from(config.open().unwrap()).unwrap();
    assert_same_contents(&map, &loaded);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sqlite_blocking_calls_inside_runtime() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(
        SqliteStorage::open(dir.path().join("attrs.db"))
            .await
            .unwrap(),
    );
    let map = sample_map().with_storage(storage.clone());

    map.save().unwrap();
    assert_same_contents(&map, &storage.load().unwrap());
}
