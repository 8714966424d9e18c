//! Storage creation for the CLI.

use std::sync::Arc;

use dynattr::{Storage, StorageConfig};

use crate::cli::{Backend, StoreArgs};

/// Map the command line options to a storage configuration.
pub fn storage_config(args: &StoreArgs) -> Result<StorageConfig, Box<dyn std::error::Error>> {
    match args.backend {
        Backend::Json => Ok(StorageConfig::Json {
            path: args.store.clone(),
            pretty: true,
        }),
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => Ok(StorageConfig::Sqlite {
            path: args.store.clone(),
        }),
        #[cfg(not(feature = "sqlite"))]
        Backend::Sqlite => Err("this build of dynattr has no SQLite support".into()),
    }
}

/// Open the storage selected on the command line
pub async fn create_storage(
    args: &StoreArgs,
) -> Result<Arc<dyn Storage>, Box<dyn std::error::Error>> {
    let config = storage_config(args)?;
    tracing::info!(backend = ?args.backend, location = %config.location(), "Opening attribute store");
    Ok(config.open_async().await?)
}
