//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use wrangle_core::PostgresConfig;

use crate::store::{StoreError, StoreResult};

/// How long a request waits for a free connection before giving up
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Build connect options from the URL, or from the discrete PG* settings.
pub fn connect_options(config: &PostgresConfig) -> StoreResult<PgConnectOptions> {
    if let Some(url) = &config.url {
        return url.parse::<PgConnectOptions>().map_err(StoreError::from);
    }

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    Ok(options)
}

/// Create a PostgreSQL connection pool.
///
/// # Errors
///
/// Returns `StoreError::Unavailable` if no connection can be established.
pub async fn create_pool(config: &PostgresConfig) -> StoreResult<PgPool> {
    let options = connect_options(config)?;
    create_pool_with_options(options, config.max_connections).await
}

/// Create a PostgreSQL connection pool with custom options.
pub async fn create_pool_with_options(
    options: PgConnectOptions,
    max_connections: u32,
) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PostgresConfig {
        PostgresConfig {
            url: None,
            host: "db.internal".into(),
            port: 6543,
            user: "app".into(),
            password: Some("p@ss:word".into()),
            database: "Wrangling".into(),
            max_connections: 5,
        }
    }

    #[test]
    fn discrete_settings_are_used() {
        let options = connect_options(&config()).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "app");
        assert_eq!(options.get_database(), Some("Wrangling"));
    }

    #[test]
    fn url_overrides_discrete_settings() {
        let mut cfg = config();
        cfg.url = Some("postgres://other@elsewhere:5432/otherdb".into());
        let options = connect_options(&cfg).unwrap();
        assert_eq!(options.get_host(), "elsewhere");
        assert_eq!(options.get_database(), Some("otherdb"));
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p wrangle-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let options: PgConnectOptions = url.parse().expect("bad DATABASE_URL");
        let pool = create_pool_with_options(options, 2)
            .await
            .expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }
}
