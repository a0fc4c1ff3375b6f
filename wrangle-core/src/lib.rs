//! wrangle-core: domain types shared by the wrangle server and CLI
//!
//! Everything that arrives from a request body or a path is validated
//! into one of these types before it reaches a store.

pub mod config;
pub mod models;

pub use config::{Backend, ConfigError, MongoConfig, PostgresConfig, SessionConfig, WrangleConfig};
pub use models::{
    is_valid_identifier, parse_columns, ColumnDef, ColumnType, ContactPatch, ContainerName,
    Credentials, FieldKind, FieldValue, Fields, NewContact, ValidationError, RESERVED_CONTAINERS,
};
