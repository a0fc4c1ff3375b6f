//! wrangle CLI - sample auth + CRUD web app over Postgres or MongoDB
//!
//! Subcommands:
//! - `serve`: run the HTTP server
//! - `init`: create the account store, contacts table and optional tables

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{run_init, run_serve, InitArgs, ServeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "wrangle",
    author,
    version,
    about = "Accounts, tables and record CRUD over Postgres or MongoDB"
)]
struct Cli {
    /// Log filter (e.g. `debug`, `wrangle_server=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Create storage (accounts, contacts, optional table) and exit
    Init(InitArgs),
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Serve(args) => run_serve(args).await?,
        Commands::Init(args) => run_init(args).await?,
    }

    Ok(())
}
