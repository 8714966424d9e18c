use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::{edit, show};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dynattr=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = backend::create_storage(&cli.store).await?;
    let format = cli.format;

    match &cli.command {
        Commands::Get(args) => show::get(storage, args, format).await,
        Commands::List => show::list(storage, format).await,
        Commands::Export => show::export(storage).await,
        Commands::Set(args) => edit::set(storage, args, format).await,
        Commands::Add(args) => edit::add(storage, args, format).await,
        Commands::Remove(args) => edit::remove(storage, args, format).await,
        Commands::Primary(args) => edit::primary(storage, args, format).await,
        Commands::Clear => edit::clear(storage, format).await,
    }
}
