//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod column;
pub mod contact;
pub mod container;
pub mod credentials;
pub mod validation;
pub mod value;

pub use column::{parse_columns, ColumnDef, ColumnType};
pub use contact::{ContactPatch, NewContact};
pub use container::{is_valid_identifier, ContainerName, RESERVED_CONTAINERS};
pub use credentials::Credentials;
pub use validation::ValidationError;
pub use value::{FieldKind, FieldValue, Fields};
