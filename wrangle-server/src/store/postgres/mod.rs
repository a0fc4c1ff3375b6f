//! Postgres backend (relational variant)
//!
//! Table and column names are validated identifiers and are always
//! double-quoted in generated SQL, so their case is preserved. Values are
//! never interpolated: records travel as one JSON parameter that Postgres
//! unpacks with `json_populate_record`, and come back via `row_to_json`.

mod accounts;
mod contacts;
pub mod pool;
mod tables;

use sqlx::PgPool;
use wrangle_core::ContainerName;

use super::StoreError;

pub use pool::create_pool;

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Double-quote an identifier.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Map `undefined_table` to a not-found for `name`; everything else as usual.
pub(crate) fn table_error(name: &ContainerName) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |err| match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01") => {
            StoreError::not_found("table", name.as_str())
        }
        _ => StoreError::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("contacts"), "\"contacts\"");
        assert_eq!(quote_ident("MixedCase"), "\"MixedCase\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
