//! Command implementations for the wrangle CLI

pub mod init;
pub mod serve;

pub use init::{run_init, InitArgs};
pub use serve::{run_serve, ServeArgs};

use anyhow::{Context, Result};
use clap::Args;
use wrangle_core::{Backend, WrangleConfig};

/// Storage selection shared by every command. Flags override the environment.
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Storage backend: postgres, mongo or memory (default: WRANGLE_BACKEND, then postgres)
    #[arg(long)]
    pub backend: Option<Backend>,

    /// Postgres connection URL (overrides DATABASE_URL / PG* variables)
    #[arg(long)]
    pub database_url: Option<String>,

    /// MongoDB connection URL (overrides MONGO_URL / MONGO_* variables)
    #[arg(long)]
    pub mongo_url: Option<String>,
}

impl StorageArgs {
    /// Environment configuration with command-line overrides applied.
    pub fn load_config(&self) -> Result<WrangleConfig> {
        let mut config = WrangleConfig::from_env().context("invalid configuration")?;
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(url) = &self.database_url {
            config.postgres.url = Some(url.clone());
        }
        if let Some(url) = &self.mongo_url {
            config.mongo.url = Some(url.clone());
        }
        Ok(config)
    }
}
