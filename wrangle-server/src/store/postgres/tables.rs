//! User-defined tables
//!
//! Rows are read back as `row_to_json(..)::text` so any column set can be
//! returned without knowing its types up front. Writes send the record as
//! one JSON parameter; `json_populate_record(NULL::"t", ..)` converts each
//! value to the column's declared type, and type mismatches surface as
//! data errors (400) rather than string-built SQL.

use async_trait::async_trait;
use wrangle_core::{
    is_valid_identifier, ColumnDef, ContainerName, Fields, ValidationError, RESERVED_CONTAINERS,
};

use super::{quote_ident, table_error, PgStore};
use crate::store::{ContainerShape, ContainerStore, Record, StoreError, StoreKind, StoreResult};

fn parse_row(json: &str) -> StoreResult<Record> {
    serde_json::from_str(json).map_err(|e| StoreError::Backend(format!("bad row json: {}", e)))
}

fn create_table_sql(name: &ContainerName, columns: &[ColumnDef]) -> String {
    let mut defs = vec!["id SERIAL PRIMARY KEY".to_owned()];
    defs.extend(
        columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type())),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(name.as_str()),
        defs.join(", ")
    )
}

/// Every record key becomes a quoted column name, so it must be a plain identifier.
fn check_column_names(fields: &Fields) -> Result<(), ValidationError> {
    match fields.keys().find(|k| !is_valid_identifier(k)) {
        Some(bad) => Err(ValidationError::InvalidIdentifier {
            field: "column name",
            value: bad.to_owned(),
        }),
        None => Ok(()),
    }
}

fn insert_sql(table: &str, fields: &Fields) -> String {
    let cols: Vec<String> = fields.keys().map(quote_ident).collect();
    let values: Vec<String> = cols.iter().map(|c| format!("_patch.{}", c)).collect();
    format!(
        "INSERT INTO {table} AS _target ({}) \
         SELECT {} FROM json_populate_record(NULL::{table}, $1::json) AS _patch \
         RETURNING row_to_json(_target.*)::text",
        cols.join(", "),
        values.join(", "),
    )
}

fn update_sql(table: &str, pk: &str, fields: &Fields) -> String {
    let sets: Vec<String> = fields
        .keys()
        .map(|k| {
            let col = quote_ident(k);
            format!("{col} = _patch.{col}")
        })
        .collect();
    format!(
        "UPDATE {table} AS _target SET {} \
         FROM json_populate_record(NULL::{table}, $1::json) AS _patch \
         WHERE _target.{}::text = $2 \
         RETURNING row_to_json(_target.*)::text",
        sets.join(", "),
        quote_ident(pk),
    )
}

fn payload(fields: &Fields) -> StoreResult<String> {
    serde_json::to_string(fields).map_err(|e| StoreError::Backend(e.to_string()))
}

impl PgStore {
    /// Primary key column of `name`. Errors with not-found when the table
    /// does not exist, and with a validation error when it has no key.
    async fn primary_key(&self, name: &ContainerName) -> StoreResult<String> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            SELECT (
                SELECT a.attname::text
                  FROM pg_index i
                  JOIN pg_attribute a
                    ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
                 WHERE i.indrelid = c.oid AND i.indisprimary
                 ORDER BY a.attnum
                 LIMIT 1
            )
              FROM (SELECT to_regclass($1::text)::oid AS oid) c
             WHERE c.oid IS NOT NULL
            "#,
        )
        .bind(quote_ident(name.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Err(StoreError::not_found("table", name.as_str())),
            Some((Some(pk),)) => Ok(pk),
            Some((None,)) => Err(ValidationError::Rejected {
                reason: format!("table '{}' has no primary key", name),
            }
            .into()),
        }
    }
}

#[async_trait]
impl ContainerStore for PgStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Relational
    }

    async fn ensure_container(
        &self,
        name: &ContainerName,
        columns: &[ColumnDef],
    ) -> StoreResult<()> {
        let sql = create_table_sql(name, columns);
        match sqlx::query(&sql).execute(&self.pool).await {
            Ok(_) => {
                tracing::info!(table = %name, columns = columns.len(), "ensured table");
                Ok(())
            }
            // Two concurrent CREATE TABLE IF NOT EXISTS can race on pg_type.
            Err(e) => match StoreError::from(e) {
                StoreError::Duplicate(_) => Ok(()),
                other => Err(other),
            },
        }
    }

    async fn list_containers(&self) -> StoreResult<Vec<String>> {
        let reserved: Vec<String> = RESERVED_CONTAINERS.iter().map(|s| s.to_string()).collect();
        let names: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT table_name::text
              FROM information_schema.tables
             WHERE table_schema = current_schema()
               AND table_type = 'BASE TABLE'
               AND NOT (table_name::text = ANY($1))
             ORDER BY table_name
            "#,
        )
        .bind(reserved)
        .fetch_all(&self.pool)
        .await?;
        Ok(names.into_iter().map(|(n,)| n).collect())
    }

    async fn describe_container(&self, name: &ContainerName) -> StoreResult<ContainerShape> {
        let columns: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT column_name::text
              FROM information_schema.columns
             WHERE table_schema = current_schema()
               AND table_name::text = $1
             ORDER BY ordinal_position
            "#,
        )
        .bind(name.as_str())
        .fetch_all(&self.pool)
        .await?;

        if columns.is_empty() {
            return Err(StoreError::not_found("table", name.as_str()));
        }

        let primary_key = match self.primary_key(name).await {
            Ok(pk) => Some(pk),
            Err(StoreError::Validation(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(ContainerShape {
            columns: columns.into_iter().map(|(c,)| c).collect(),
            primary_key,
        })
    }

    async fn list_records(&self, name: &ContainerName, limit: i64) -> StoreResult<Vec<Record>> {
        let table = quote_ident(name.as_str());
        let order = match self.primary_key(name).await {
            Ok(pk) => format!(" ORDER BY _row.{}", quote_ident(&pk)),
            Err(StoreError::Validation(_)) => String::new(),
            Err(e) => return Err(e),
        };
        let sql = format!("SELECT row_to_json(_row.*)::text FROM {table} AS _row{order} LIMIT $1");

        let rows: Vec<(String,)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(table_error(name))?;
        rows.iter().map(|(json,)| parse_row(json)).collect()
    }

    async fn get_record(&self, name: &ContainerName, id: &str) -> StoreResult<Record> {
        let pk = self.primary_key(name).await?;
        let sql = format!(
            "SELECT row_to_json(_row.*)::text FROM {} AS _row WHERE _row.{}::text = $1",
            quote_ident(name.as_str()),
            quote_ident(&pk),
        );

        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(table_error(name))?;
        match row {
            Some((json,)) => parse_row(&json),
            None => Err(StoreError::not_found("record", id)),
        }
    }

    async fn insert_record(&self, name: &ContainerName, mut fields: Fields) -> StoreResult<Record> {
        let pk = self.primary_key(name).await?;
        fields.remove(&pk);
        if fields.is_empty() {
            return Err(ValidationError::Empty { field: "record" }.into());
        }
        check_column_names(&fields)?;

        let sql = insert_sql(&quote_ident(name.as_str()), &fields);
        let (json,): (String,) = sqlx::query_as(&sql)
            .bind(payload(&fields)?)
            .fetch_one(&self.pool)
            .await
            .map_err(table_error(name))?;
        parse_row(&json)
    }

    async fn update_record(
        &self,
        name: &ContainerName,
        id: &str,
        mut fields: Fields,
    ) -> StoreResult<Record> {
        let pk = self.primary_key(name).await?;
        fields.remove(&pk);
        if fields.is_empty() {
            return self.get_record(name, id).await;
        }
        check_column_names(&fields)?;

        let sql = update_sql(&quote_ident(name.as_str()), &pk, &fields);
        let row: Option<(String,)> = sqlx::query_as(&sql)
            .bind(payload(&fields)?)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(table_error(name))?;
        match row {
            Some((json,)) => parse_row(&json),
            None => Err(StoreError::not_found("record", id)),
        }
    }

    async fn delete_record(&self, name: &ContainerName, id: &str) -> StoreResult<()> {
        let pk = self.primary_key(name).await?;
        let sql = format!(
            "DELETE FROM {} AS _target WHERE _target.{}::text = $1",
            quote_ident(name.as_str()),
            quote_ident(&pk),
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(table_error(name))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("record", id));
        }
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrangle_core::{parse_columns, FieldValue};

    #[test]
    fn record_keys_must_be_identifiers() {
        let ok: Fields = [("title", "Dune"), ("page_count", "412")].into_iter().collect();
        assert!(check_column_names(&ok).is_ok());

        for bad in ["", "two words", "x\"; DROP TABLE users; --", "1st"] {
            let fields: Fields = [(bad, 1i64)].into_iter().collect();
            assert_eq!(
                check_column_names(&fields),
                Err(ValidationError::InvalidIdentifier {
                    field: "column name",
                    value: bad.to_owned(),
                })
            );
        }
    }

    #[test]
    fn create_table_always_has_serial_id() {
        let name = ContainerName::new("books").unwrap();
        let columns = parse_columns("title, pages:int").unwrap();
        assert_eq!(
            create_table_sql(&name, &columns),
            r#"CREATE TABLE IF NOT EXISTS "books" (id SERIAL PRIMARY KEY, "title" TEXT, "pages" INTEGER)"#
        );
    }

    #[test]
    fn insert_selects_supplied_columns_from_payload() {
        let fields: Fields = [("title", FieldValue::from("Dune")), ("pages", 412i64.into())]
            .into_iter()
            .collect();
        let sql = insert_sql("\"books\"", &fields);
        assert!(sql.contains(r#"("title", "pages")"#));
        assert!(sql.contains(r#"SELECT _patch."title", _patch."pages""#));
        assert!(sql.contains(r#"json_populate_record(NULL::"books", $1::json)"#));
    }

    #[test]
    fn update_only_sets_supplied_columns() {
        let fields: Fields = [("pages", 413i64)].into_iter().collect();
        let sql = update_sql("\"books\"", "id", &fields);
        assert!(sql.contains(r#"SET "pages" = _patch."pages" FROM"#));
        assert!(sql.contains(r#"WHERE _target."id"::text = $2"#));
        assert!(!sql.contains("title"));
    }

    #[test]
    fn payload_keeps_json_types() {
        let fields: Fields = [("pages", FieldValue::Int(3)), ("read", FieldValue::Bool(true))]
            .into_iter()
            .collect();
        assert_eq!(payload(&fields).unwrap(), r#"{"pages":3,"read":true}"#);
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p wrangle-server -- --ignored

    async fn test_store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let options = url.parse().expect("bad DATABASE_URL");
        let pool = super::super::pool::create_pool_with_options(options, 2)
            .await
            .expect("pool creation failed");
        PgStore::new(pool)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn record_lifecycle() {
        let store = test_store().await;
        let name = ContainerName::new("wrangle_it_books").unwrap();
        sqlx::query(r#"DROP TABLE IF EXISTS "wrangle_it_books""#)
            .execute(store.pool())
            .await
            .unwrap();

        let columns = parse_columns("title, pages:int").unwrap();
        store.ensure_container(&name, &columns).await.unwrap();
        store.ensure_container(&name, &columns).await.unwrap();

        let shape = store.describe_container(&name).await.unwrap();
        assert_eq!(shape.columns, vec!["id", "title", "pages"]);
        assert_eq!(shape.primary_key.as_deref(), Some("id"));

        let fields: Fields = [("title", FieldValue::from("Dune")), ("pages", 412i64.into())]
            .into_iter()
            .collect();
        let created = store.insert_record(&name, fields).await.unwrap();
        let id = created.get("id").and_then(FieldValue::as_i64).unwrap().to_string();

        let patch: Fields = [("pages", 413i64)].into_iter().collect();
        let updated = store.update_record(&name, &id, patch).await.unwrap();
        assert_eq!(updated.get("title"), Some(&FieldValue::from("Dune")));
        assert_eq!(updated.get("pages"), Some(&FieldValue::Int(413)));

        let bad: Fields = [("pages", "many")].into_iter().collect();
        assert!(matches!(
            store.update_record(&name, &id, bad).await,
            Err(StoreError::Validation(_))
        ));

        store.delete_record(&name, &id).await.unwrap();
        assert!(matches!(
            store.get_record(&name, &id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_table_is_not_found() {
        let store = test_store().await;
        let name = ContainerName::new("wrangle_it_missing").unwrap();
        assert!(matches!(
            store.get_record(&name, "1").await,
            Err(StoreError::NotFound { resource: "table", .. })
        ));
    }
}
