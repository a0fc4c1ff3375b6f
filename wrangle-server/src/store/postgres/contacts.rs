//! Contact repository over the fixed `contacts` table

use async_trait::async_trait;
use wrangle_core::{ContactPatch, NewContact};

use super::PgStore;
use crate::store::{Contact, ContactStore, StoreError, StoreResult};

fn duplicate_email(email: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| match StoreError::from(e) {
        StoreError::Duplicate(_) => {
            StoreError::Duplicate(format!("a contact with email '{}' already exists", email))
        }
        other => other,
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn ensure_contacts(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_email(&contact.email))
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email
              FROM contacts
             ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    async fn get_contact(&self, id: i32) -> StoreResult<Contact> {
        sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email
              FROM contacts
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("contact", id.to_string()))
    }

    async fn update_contact(&self, id: i32, patch: ContactPatch) -> StoreResult<Contact> {
        let email = patch.email.clone().unwrap_or_default();
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email)
             WHERE id = $1
            RETURNING id, name, email
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(duplicate_email(&email))?
        .ok_or_else(|| StoreError::not_found("contact", id.to_string()))
    }

    async fn delete_contact(&self, id: i32) -> StoreResult<Contact> {
        sqlx::query_as::<_, Contact>(
            r#"
            DELETE FROM contacts
             WHERE id = $1
            RETURNING id, name, email
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("contact", id.to_string()))
    }
}
