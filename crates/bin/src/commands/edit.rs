//! Commands that modify the store: set, add, remove, primary and clear.
//!
//! Each command loads the map, applies one change and saves it back.

use std::sync::Arc;

use dynattr::{AttributeMap, Storage, Value, ValueList};

use crate::cli::{PrimaryArgs, RemoveArgs, ValuesArgs};
use crate::output::OutputFormat;

fn parse_values(args: &ValuesArgs) -> Result<ValueList, Box<dyn std::error::Error>> {
    args.values
        .iter()
        .map(|input| args.kind.parse_text(input))
        .collect::<Result<Vec<Value>, _>>()
        .map(ValueList::from)
        .map_err(Into::into)
}

async fn save(map: &AttributeMap) -> Result<(), Box<dyn std::error::Error>> {
    map.save_async().await?;
    tracing::debug!(keys = map.len(), "Attribute store saved");
    Ok(())
}

fn report(
    format: OutputFormat,
    key: &str,
    map: &AttributeMap,
) -> Result<(), Box<dyn std::error::Error>> {
    let list = map.get(key);
    match format {
        OutputFormat::Human => println!("{}: {list}", key.to_lowercase()),
        OutputFormat::Json => {
            let values: Vec<String> = list.iter().map(ToString::to_string).collect();
            let value = serde_json::json!({
                "key": key.to_lowercase(),
                "values": values,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

/// Run the set command
pub async fn set(
    storage: Arc<dyn Storage>,
    args: &ValuesArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = parse_values(args)?;
    let mut map = AttributeMap::load_from_async(storage).await?;
    map.set(&args.key, values);
    save(&map).await?;
    report(format, &args.key, &map)
}

/// Run the add command
pub async fn add(
    storage: Arc<dyn Storage>,
    args: &ValuesArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let values = parse_values(args)?;
    let mut map = AttributeMap::load_from_async(storage).await?;
    *map.entry(&args.key) += &values;
    save(&map).await?;
    report(format, &args.key, &map)
}

/// Run the remove command
pub async fn remove(
    storage: Arc<dyn Storage>,
    args: &RemoveArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut map = AttributeMap::load_from_async(storage).await?;

    match &args.value {
        None => {
            if !map.remove(&args.key) {
                return Err(format!("No attribute named '{}'", args.key).into());
            }
        }
        Some(value) => {
            let mut list = map
                .get_mut(&args.key)
                .ok_or_else(|| format!("No attribute named '{}'", args.key))?;
            let index = list
                .iter()
                .position(|v| v.to_string() == *value)
                .ok_or_else(|| format!("'{}' has no value '{value}'", args.key))?;
            list.remove_at(index);
        }
    }

    save(&map).await?;
    report(format, &args.key, &map)
}

/// Run the primary command
pub async fn primary(
    storage: Arc<dyn Storage>,
    args: &PrimaryArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut map = AttributeMap::load_from_async(storage).await?;
    {
        let mut list = map
            .get_mut(&args.key)
            .ok_or_else(|| format!("No attribute named '{}'", args.key))?;
        if !list.set_primary(args.index) {
            return Err(format!(
                "Index {} is out of range for '{}' with {} values",
                args.index,
                args.key,
                list.len()
            )
            .into());
        }
    }
    save(&map).await?;
    report(format, &args.key, &map)
}

/// Run the clear command
pub async fn clear(
    storage: Arc<dyn Storage>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut map = AttributeMap::load_from_async(storage).await?;
    let removed = map.len();
    map.clear();
    save(&map).await?;

    match format {
        OutputFormat::Human => println!("Removed {removed} attributes"),
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "removed": removed }));
        }
    }
    Ok(())
}
