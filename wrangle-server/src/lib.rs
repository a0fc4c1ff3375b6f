//! wrangle-server: accounts, containers and record CRUD over HTTP
//!
//! One router serves both variants. The backend chosen at startup decides
//! whether containers are Postgres tables (with the fixed `contacts` API)
//! or MongoDB collections.

pub mod auth;
pub mod http;
pub mod state;
pub mod store;

use std::sync::Arc;

use wrangle_core::{Backend, WrangleConfig};

pub use http::{run_server, ApiError, ServerConfig};
pub use state::AppState;
pub use store::{MemoryStore, MongoStore, PgStore, StoreError, StoreResult, Stores};

/// Connect to the configured backend and build the shared handler state.
pub async fn connect(config: &WrangleConfig) -> StoreResult<AppState> {
    let stores = match config.backend {
        Backend::Postgres => {
            let pool = store::postgres::create_pool(&config.postgres).await?;
            Stores::postgres(PgStore::new(pool))
        }
        Backend::Mongo => Stores::mongo(MongoStore::connect(&config.mongo).await?),
        Backend::Memory => Stores::memory(Arc::new(MemoryStore::new())),
    };
    tracing::info!(backend = %config.backend, "storage backend connected");

    Ok(AppState::new(stores, &config.session, config.bcrypt_cost))
}
