//! SQL schema definitions and migrations.
//!
//! Migrations are code-based. To change the schema:
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a `migrate_vN_to_vM` async function
//! 3. Add it to the match in `run_migration`

use super::{SqliteStorage, SqlxResultExt};
use crate::{Result, storage::StorageError};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // One row per key; value holds the tagged list as JSON
    "CREATE TABLE IF NOT EXISTS attributes (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )",
];

/// Initialize the database schema, migrating older versions.
pub async fn initialize(storage: &SqliteStorage) -> Result<()> {
    let pool = storage.pool();

    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(storage, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(StorageError::SqlxError {
                reason: format!(
                    "Database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    Ok(())
}

async fn migrate(storage: &SqliteStorage, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        run_migration(storage, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(storage.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    Ok(())
}

/// Apply the migration from `from` to `to`.
///
/// Placeholder: version 1 is the only schema so far, so every path is unknown. Add a match arm
/// per step when `SCHEMA_VERSION` is bumped.
async fn run_migration(storage: &SqliteStorage, from: i64, to: i64) -> Result<()> {
    let _ = storage;
    Err(StorageError::SqlxError {
        reason: format!("Unknown migration path: v{from} to v{to}"),
        source: None,
    }
    .into())
}
