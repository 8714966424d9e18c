//! CLI argument definitions for the dynattr binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dynattr::ValueKind;

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// A single JSON document (default)
    Json,
    /// SQLite database, one row per key
    Sqlite,
}

/// Inspect and edit a dynattr attribute store
#[derive(Parser, Debug)]
#[command(name = "dynattr")]
#[command(about = "dynattr: multi-valued, case-insensitive attribute store")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output format
    #[arg(long, global = true, default_value = "human", env = "DYNATTR_FORMAT")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the attributes live
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// Path of the attribute store
    #[arg(
        short,
        long,
        global = true,
        default_value = "attributes.json",
        env = "DYNATTR_STORE"
    )]
    pub store: PathBuf,

    /// Storage backend to use
    #[arg(short, long, global = true, default_value = "json", env = "DYNATTR_BACKEND")]
    pub backend: Backend,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the primary value of a key
    Get(GetArgs),
    /// Replace the values of a key
    Set(ValuesArgs),
    /// Append values to a key, creating it if needed
    Add(ValuesArgs),
    /// Remove a key, or a single value of it
    Remove(RemoveArgs),
    /// Move a value to the front of its list
    Primary(PrimaryArgs),
    /// List keys with their value counts
    List,
    /// Remove every key
    Clear,
    /// Print the stored document as tagged JSON
    Export,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    pub key: String,

    /// Print every value instead of just the primary one
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the set and add commands
#[derive(clap::Args, Debug)]
pub struct ValuesArgs {
    pub key: String,

    #[arg(required = true)]
    pub values: Vec<String>,

    /// Kind the values are parsed as
    #[arg(short, long, default_value = "text")]
    pub kind: ValueKind,
}

/// Arguments for the remove command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    pub key: String,

    /// Remove only the first value that displays as this
    pub value: Option<String>,
}

/// Arguments for the primary command
#[derive(clap::Args, Debug)]
pub struct PrimaryArgs {
    pub key: String,

    /// Index of the value to move to the front
    pub index: usize,
}
