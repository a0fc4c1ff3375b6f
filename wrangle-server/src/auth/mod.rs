//! Accounts and sessions
//!
//! - `password`: bcrypt hashing on the blocking pool
//! - `service`: signup / login against an `AccountStore`
//! - `session`: encrypted session cookie extractor

pub mod error;
pub mod password;
pub mod service;
pub mod session;

pub use error::{AuthError, AuthResult};
pub use service::AuthService;
pub use session::{Session, SessionUser, SESSION_COOKIE};
