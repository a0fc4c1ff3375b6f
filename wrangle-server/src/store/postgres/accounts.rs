//! Account repository over the `users` table

use async_trait::async_trait;
use sqlx::FromRow;

use super::PgStore;
use crate::store::{Account, AccountStore, StoreError, StoreResult, StoredAccount};

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    name: String,
    password: String,
}

#[async_trait]
impl AccountStore for PgStore {
    async fn ensure_accounts(&self) -> StoreResult<()> {
        // The column is called `password` but only ever holds a bcrypt hash.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_account(&self, name: &str, password_hash: &str) -> StoreResult<Account> {
        let (id, name): (i32, String) = sqlx::query_as(
            r#"
            INSERT INTO users (name, password)
            VALUES ($1, $2)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Duplicate(_) => {
                StoreError::Duplicate(format!("username '{}' already exists", name))
            }
            other => other,
        })?;

        Ok(Account {
            id: id.to_string(),
            name,
        })
    }

    async fn find_account(&self, name: &str) -> StoreResult<Option<StoredAccount>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, password
              FROM users
             WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| StoredAccount {
            account: Account {
                id: r.id.to_string(),
                name: r.name,
            },
            password_hash: r.password,
        }))
    }
}
