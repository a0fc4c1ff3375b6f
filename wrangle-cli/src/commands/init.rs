//! Storage initialisation command

use anyhow::{Context, Result};
use clap::Parser;
use wrangle_core::{parse_columns, ContainerName};

use super::StorageArgs;

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Also create this table / collection
    #[arg(long)]
    pub table: Option<String>,

    /// Columns for --table, e.g. "title, pages:int, read:bool"
    #[arg(long, requires = "table", default_value = "")]
    pub columns: String,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Create the account store and contacts table, then the optional table.
pub async fn run_init(args: InitArgs) -> Result<()> {
    let config = args.storage.load_config()?;

    // Validate before connecting
    let table = match &args.table {
        Some(raw) => {
            let name = ContainerName::new(raw).context("invalid --table")?;
            let columns = parse_columns(&args.columns).context("invalid --columns")?;
            Some((name, columns))
        }
        None => None,
    };

    let state = wrangle_server::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {} storage", config.backend))?;
    state
        .stores()
        .bootstrap()
        .await
        .context("Failed to create account store")?;

    if let Some((name, columns)) = table {
        state
            .containers()
            .ensure_container(&name, &columns)
            .await
            .with_context(|| format!("Failed to create '{}'", name))?;
        tracing::info!(table = %name, columns = columns.len(), "table ready");
    }

    state.containers().close().await;
    tracing::info!(backend = %config.backend, "storage initialised");
    Ok(())
}
