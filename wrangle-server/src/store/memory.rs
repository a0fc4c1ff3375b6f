//! In-process store
//!
//! Behaves like the relational backend (serial `id` keys, declared columns,
//! unique account names and contact emails) without a database. Used by
//! `--backend memory` and by the HTTP tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use wrangle_core::{
    ColumnDef, ColumnType, ContactPatch, ContainerName, FieldValue, Fields, NewContact, ValidationError,
    RESERVED_CONTAINERS,
};

use super::{
    Account, AccountStore, Contact, ContactStore, ContainerShape, ContainerStore, Record,
    StoreError, StoreKind, StoreResult, StoredAccount,
};

const CONTACTS: &str = "contacts";
const PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone)]
struct MemColumn {
    name: String,
    ty: ColumnType,
    not_null: bool,
}

impl MemColumn {
    fn declared(def: &ColumnDef) -> Self {
        Self {
            name: def.name.clone(),
            ty: def.ty,
            not_null: false,
        }
    }

    fn required(def: &ColumnDef) -> Self {
        Self {
            not_null: true,
            ..Self::declared(def)
        }
    }

    /// Convert `value` the way Postgres casts a JSON value into this column.
    fn coerce(&self, value: FieldValue) -> StoreResult<FieldValue> {
        let coerced = match (self.ty, value) {
            (_, FieldValue::Null) => {
                if self.not_null {
                    return Err(reject(format!(
                        "null value in column \"{}\" violates not-null constraint",
                        self.name
                    )));
                }
                Some(FieldValue::Null)
            }
            (ColumnType::Text, FieldValue::Text(s)) => Some(FieldValue::Text(s)),
            (ColumnType::Text, FieldValue::Int(n)) => Some(FieldValue::Text(n.to_string())),
            (ColumnType::Text, FieldValue::Float(x)) => Some(FieldValue::Text(x.to_string())),
            (ColumnType::Text, FieldValue::Bool(b)) => Some(FieldValue::Text(b.to_string())),
            (ColumnType::Text, nested) => serde_json::to_string(&nested).ok().map(FieldValue::Text),
            (ColumnType::Integer, FieldValue::Int(n)) => {
                i32::try_from(n).ok().map(|n| FieldValue::Int(n.into()))
            }
            (ColumnType::Integer, FieldValue::Text(s)) => {
                s.trim().parse::<i32>().ok().map(|n| FieldValue::Int(n.into()))
            }
            (ColumnType::Boolean, FieldValue::Bool(b)) => Some(FieldValue::Bool(b)),
            (ColumnType::Boolean, FieldValue::Text(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "on" | "1" => Some(FieldValue::Bool(true)),
                    "false" | "f" | "no" | "off" | "0" => Some(FieldValue::Bool(false)),
                    _ => None,
                }
            }
            (ColumnType::Timestamp, FieldValue::Text(s)) if !s.trim().is_empty() => {
                Some(FieldValue::Text(s))
            }
            _ => None,
        };
        coerced.ok_or_else(|| {
            reject(format!(
                "invalid input for column \"{}\" of type {}",
                self.name,
                self.ty.sql_type().to_ascii_lowercase()
            ))
        })
    }
}

fn reject(reason: String) -> StoreError {
    ValidationError::Rejected { reason }.into()
}

#[derive(Debug)]
struct MemTable {
    columns: Vec<MemColumn>,
    next_id: i64,
    rows: BTreeMap<i64, Fields>,
}

impl MemTable {
    fn new(columns: Vec<MemColumn>) -> Self {
        Self {
            columns,
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn column_names(&self) -> Vec<String> {
        std::iter::once(PRIMARY_KEY.to_owned())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Check every supplied key names a column and convert its value to the column type.
    fn coerce(&self, table: &str, fields: Fields) -> StoreResult<Fields> {
        let mut out = Fields::with_capacity(fields.len());
        for (key, value) in fields {
            let column = self.columns.iter().find(|c| c.name == key).ok_or_else(|| {
                reject(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    key, table
                ))
            })?;
            out.insert(key, column.coerce(value)?);
        }
        Ok(out)
    }

    /// Full row in column order, unsupplied columns null.
    fn row(&self, id: i64, mut fields: Fields) -> StoreResult<Fields> {
        let mut row = Fields::with_capacity(self.columns.len() + 1);
        row.insert(PRIMARY_KEY, id);
        for column in &self.columns {
            let value = match fields.remove(&column.name) {
                Some(value) => value,
                None => column.coerce(FieldValue::Null)?,
            };
            row.insert(column.name.clone(), value);
        }
        Ok(row)
    }

    fn insert(&mut self, table: &str, fields: Fields) -> StoreResult<Fields> {
        let fields = self.coerce(table, fields)?;
        let row = self.row(self.next_id, fields)?;
        self.rows.insert(self.next_id, row.clone());
        self.next_id += 1;
        Ok(row)
    }

    fn update(&mut self, table: &str, key: i64, fields: Fields) -> StoreResult<Fields> {
        let fields = self.coerce(table, fields)?;
        let row = self
            .rows
            .get_mut(&key)
            .ok_or_else(|| StoreError::not_found("record", key.to_string()))?;
        row.merge(fields);
        Ok(row.clone())
    }
}

#[derive(Debug, Default)]
struct MemState {
    tables: BTreeMap<String, MemTable>,
    accounts: Vec<StoredAccount>,
}

impl MemState {
    fn table(&self, name: &str) -> StoreResult<&MemTable> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::not_found("table", name))
    }

    fn table_mut(&mut self, name: &str) -> StoreResult<&mut MemTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found("table", name))
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.tables.get(CONTACTS).is_some_and(|t| {
            t.rows.iter().any(|(id, row)| {
                Some(*id) != except && row.get("email").and_then(FieldValue::as_text) == Some(email)
            })
        })
    }
}

/// Store keeping everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_key(id: &str) -> StoreResult<i64> {
    id.parse().map_err(|_| StoreError::not_found("record", id))
}

fn to_contact(row: &Fields) -> StoreResult<Contact> {
    let text = |key: &str| {
        row.get(key)
            .and_then(FieldValue::as_text)
            .map(str::to_owned)
            .ok_or_else(|| StoreError::Backend(format!("contact row missing {}", key)))
    };
    let id = row
        .get(PRIMARY_KEY)
        .and_then(FieldValue::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| StoreError::Backend("contact row missing id".into()))?;
    Ok(Contact {
        id,
        name: text("name")?,
        email: text("email")?,
    })
}

fn duplicate_email(email: &str) -> StoreError {
    StoreError::Duplicate(format!("a contact with email '{}' already exists", email))
}

#[async_trait]
impl ContainerStore for MemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Relational
    }

    async fn ensure_container(
        &self,
        name: &ContainerName,
        columns: &[ColumnDef],
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .tables
            .entry(name.as_str().to_owned())
            .or_insert_with(|| MemTable::new(columns.iter().map(MemColumn::declared).collect()));
        Ok(())
    }

    async fn list_containers(&self) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .tables
            .keys()
            .filter(|n| !RESERVED_CONTAINERS.contains(&n.as_str()))
            .cloned()
            .collect())
    }

    async fn describe_container(&self, name: &ContainerName) -> StoreResult<ContainerShape> {
        let state = self.state.read().await;
        let table = state.table(name.as_str())?;
        Ok(ContainerShape {
            columns: table.column_names(),
            primary_key: Some(PRIMARY_KEY.to_owned()),
        })
    }

    async fn list_records(&self, name: &ContainerName, limit: i64) -> StoreResult<Vec<Record>> {
        let state = self.state.read().await;
        let table = state.table(name.as_str())?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(table.rows.values().take(limit).cloned().collect())
    }

    async fn get_record(&self, name: &ContainerName, id: &str) -> StoreResult<Record> {
        let state = self.state.read().await;
        let table = state.table(name.as_str())?;
        let key = parse_key(id)?;
        table
            .rows
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("record", id))
    }

    async fn insert_record(&self, name: &ContainerName, mut fields: Fields) -> StoreResult<Record> {
        fields.remove(PRIMARY_KEY);
        if fields.is_empty() {
            return Err(ValidationError::Empty { field: "record" }.into());
        }

        let mut state = self.state.write().await;
        if name.as_str() == CONTACTS {
            if let Some(email) = fields.get("email").and_then(FieldValue::as_text) {
                if state.email_taken(email, None) {
                    return Err(duplicate_email(email));
                }
            }
        }
        let table = state.table_mut(name.as_str())?;
        table.insert(name.as_str(), fields)
    }

    async fn update_record(
        &self,
        name: &ContainerName,
        id: &str,
        mut fields: Fields,
    ) -> StoreResult<Record> {
        fields.remove(PRIMARY_KEY);
        let mut state = self.state.write().await;
        let key = parse_key(id)?;
        if name.as_str() == CONTACTS {
            if let Some(email) = fields.get("email").and_then(FieldValue::as_text) {
                if state.email_taken(email, Some(key)) {
                    return Err(duplicate_email(email));
                }
            }
        }

        state.table_mut(name.as_str())?.update(name.as_str(), key, fields)
    }

    async fn delete_record(&self, name: &ContainerName, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let table = state.table_mut(name.as_str())?;
        let key = parse_key(id)?;
        table
            .rows
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("record", id))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn ensure_accounts(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_account(&self, name: &str, password_hash: &str) -> StoreResult<Account> {
        let mut state = self.state.write().await;
        if state.accounts.iter().any(|a| a.account.name == name) {
            return Err(StoreError::Duplicate(format!(
                "username '{}' already exists",
                name
            )));
        }
        let account = Account {
            id: (state.accounts.len() + 1).to_string(),
            name: name.to_owned(),
        };
        state.accounts.push(StoredAccount {
            account: account.clone(),
            password_hash: password_hash.to_owned(),
        });
        Ok(account)
    }

    async fn find_account(&self, name: &str) -> StoreResult<Option<StoredAccount>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.account.name == name)
            .cloned())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn ensure_contacts(&self) -> StoreResult<()> {
        let columns = [
            MemColumn::required(&ColumnDef::new("name", ColumnType::Text)?),
            MemColumn::required(&ColumnDef::new("email", ColumnType::Text)?),
        ];
        let mut state = self.state.write().await;
        state
            .tables
            .entry(CONTACTS.to_owned())
            .or_insert_with(|| MemTable::new(columns.to_vec()));
        Ok(())
    }

    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let fields: Fields = [("name", contact.name), ("email", contact.email)]
            .into_iter()
            .collect();
        let row = self.insert_record(&ContainerName::contacts(), fields).await?;
        to_contact(&row)
    }

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>> {
        let state = self.state.read().await;
        let table = state.table(CONTACTS)?;
        table.rows.values().map(to_contact).collect()
    }

    async fn get_contact(&self, id: i32) -> StoreResult<Contact> {
        self.get_record(&ContainerName::contacts(), &id.to_string())
            .await
            .and_then(|row| to_contact(&row))
            .map_err(|e| contact_not_found(e, id))
    }

    async fn update_contact(&self, id: i32, patch: ContactPatch) -> StoreResult<Contact> {
        let mut fields = Fields::new();
        if let Some(name) = patch.name {
            fields.insert("name", name);
        }
        if let Some(email) = patch.email {
            fields.insert("email", email);
        }
        self.update_record(&ContainerName::contacts(), &id.to_string(), fields)
            .await
            .and_then(|row| to_contact(&row))
            .map_err(|e| contact_not_found(e, id))
    }

    async fn delete_contact(&self, id: i32) -> StoreResult<Contact> {
        let mut state = self.state.write().await;
        let row = state
            .table_mut(CONTACTS)?
            .rows
            .remove(&i64::from(id))
            .ok_or_else(|| StoreError::not_found("contact", id.to_string()))?;
        to_contact(&row)
    }
}

fn contact_not_found(err: StoreError, id: i32) -> StoreError {
    match err {
        StoreError::NotFound {
            resource: "record", ..
        } => StoreError::not_found("contact", id.to_string()),
        other => other,
    }
}
