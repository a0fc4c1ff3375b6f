//! Storage layer - store traits and their backends
//!
//! Handlers only see the traits. Each backend implements the subset it
//! supports:
//! - `PgStore`: containers, accounts, contacts (relational variant)
//! - `MongoStore`: containers, accounts (document variant)
//! - `MemoryStore`: all three, process-local
//!
//! Nothing is cached in-process; every read goes back to the store.

pub mod error;
pub mod memory;
pub mod mongo;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use wrangle_core::{ColumnDef, ContactPatch, ContainerName, Fields, NewContact};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use postgres::PgStore;

/// Row cap for container views
pub const VIEW_ROW_LIMIT: i64 = 200;

/// One row or one document
pub type Record = Fields;

/// How a backend lays out containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Fixed, declared columns and an integer primary key
    Relational,
    /// Open-ended fields and a store-generated `_id`
    Document,
}

/// Column (or inferred field) names of a container plus its key column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerShape {
    pub columns: Vec<String>,
    pub primary_key: Option<String>,
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// Account plus the stored password hash, only used for login
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub account: Account,
    pub password_hash: String,
}

/// Row of the fixed contacts table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Tables / collections and the records inside them
#[async_trait]
pub trait ContainerStore: Send + Sync + 'static {
    fn kind(&self) -> StoreKind;

    /// Make sure `name` exists. Existing containers are left untouched.
    async fn ensure_container(&self, name: &ContainerName, columns: &[ColumnDef])
        -> StoreResult<()>;

    /// User-visible containers, sorted by name.
    async fn list_containers(&self) -> StoreResult<Vec<String>>;

    async fn describe_container(&self, name: &ContainerName) -> StoreResult<ContainerShape>;

    async fn list_records(&self, name: &ContainerName, limit: i64) -> StoreResult<Vec<Record>>;

    async fn get_record(&self, name: &ContainerName, id: &str) -> StoreResult<Record>;

    /// Insert and return the stored record including its generated key.
    /// A caller-supplied key field is dropped.
    async fn insert_record(&self, name: &ContainerName, fields: Fields) -> StoreResult<Record>;

    /// Change only the supplied fields. An empty patch returns the record unchanged.
    async fn update_record(&self, name: &ContainerName, id: &str, fields: Fields)
        -> StoreResult<Record>;

    async fn delete_record(&self, name: &ContainerName, id: &str) -> StoreResult<()>;

    /// Release connections at shutdown.
    async fn close(&self) {}
}

/// Account records (the `users` table / collection)
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn ensure_accounts(&self) -> StoreResult<()>;

    /// Fails with `StoreError::Duplicate` when the name is taken.
    async fn create_account(&self, name: &str, password_hash: &str) -> StoreResult<Account>;

    async fn find_account(&self, name: &str) -> StoreResult<Option<StoredAccount>>;
}

/// The fixed contacts table
#[async_trait]
pub trait ContactStore: Send + Sync + 'static {
    async fn ensure_contacts(&self) -> StoreResult<()>;

    async fn create_contact(&self, contact: NewContact) -> StoreResult<Contact>;

    async fn list_contacts(&self) -> StoreResult<Vec<Contact>>;

    async fn get_contact(&self, id: i32) -> StoreResult<Contact>;

    async fn update_contact(&self, id: i32, patch: ContactPatch) -> StoreResult<Contact>;

    /// Returns the deleted row.
    async fn delete_contact(&self, id: i32) -> StoreResult<Contact>;
}

/// The stores a running server talks to
#[derive(Clone)]
pub struct Stores {
    pub containers: Arc<dyn ContainerStore>,
    pub accounts: Arc<dyn AccountStore>,
    /// Only the relational variant serves `/contacts`
    pub contacts: Option<Arc<dyn ContactStore>>,
}

impl Stores {
    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            containers: store.clone(),
            accounts: store.clone(),
            contacts: Some(store),
        }
    }

    pub fn mongo(store: MongoStore) -> Self {
        let store = Arc::new(store);
        Self {
            containers: store.clone(),
            accounts: store,
            contacts: None,
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            containers: store.clone(),
            accounts: store.clone(),
            contacts: Some(store),
        }
    }

    /// Create the account store and, for the relational variant, the
    /// contacts table. Safe to run on every start.
    pub async fn bootstrap(&self) -> StoreResult<()> {
        self.accounts.ensure_accounts().await?;
        if let Some(contacts) = &self.contacts {
            contacts.ensure_contacts().await?;
        }
        tracing::info!(kind = ?self.containers.kind(), "storage bootstrap complete");
        Ok(())
    }
}
