//! Read-only commands: get, list and export.

use std::sync::Arc;

use dynattr::{AttributeMap, Storage, codec::{ListTag, TaggedDocument}};

use crate::cli::GetArgs;
use crate::output::{OutputFormat, print_table};

/// Run the get command
pub async fn get(
    storage: Arc<dyn Storage>,
    args: &GetArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = AttributeMap::load_from_async(storage).await?;
    let list = map.get(&args.key);

    let values: Vec<String> = if args.all {
        list.iter().map(ToString::to_string).collect()
    } else {
        list.primary().map(ToString::to_string).into_iter().collect()
    };

    match format {
        OutputFormat::Human => {
            for value in &values {
                println!("{value}");
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "key": args.key.to_lowercase(),
                "type": ListTag::of(list).to_string(),
                "values": values,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}

/// Run the list command
pub async fn list(
    storage: Arc<dyn Storage>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let map = AttributeMap::load_from_async(storage).await?;
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(key, _)| *key);

    match format {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("No attributes found.");
                return Ok(());
            }

            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|(key, list)| {
                    vec![
                        key.to_string(),
                        ListTag::of(list).to_string(),
                        list.len().to_string(),
                        list.primary().map(ToString::to_string).unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["KEY", "TYPE", "COUNT", "PRIMARY"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = entries
                .iter()
                .map(|(key, list)| {
                    serde_json::json!({
                        "key": key,
                        "type": ListTag::of(list).to_string(),
                        "count": list.len(),
                        "primary": list.primary().map(ToString::to_string),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(())
}

/// Run the export command. Always prints JSON.
pub async fn export(storage: Arc<dyn Storage>) -> Result<(), Box<dyn std::error::Error>> {
    let map = AttributeMap::load_from_async(storage).await?;
    let document = TaggedDocument::encode(&map);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
