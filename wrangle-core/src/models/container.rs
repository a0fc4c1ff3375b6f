//! Container (table / collection) name validation
//!
//! Names follow SQL identifier rules so the same value is usable as a
//! Postgres table name and a MongoDB collection name.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Postgres truncates identifiers past 63 bytes
const MAX_IDENTIFIER_LEN: usize = 63;

/// Containers that hold accounts and are never reachable through the record API
pub const RESERVED_CONTAINERS: &[&str] = &["users"];

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid identifier regex"));

/// Returns true if `name` is usable as a table, collection or column name.
pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && IDENT_RE.is_match(name)
}

/// Validated container name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    /// Create a container name, validating identifier format.
    ///
    /// # Rules
    /// - Max 63 characters
    /// - Letters, digits, underscore
    /// - Must start with a letter or underscore
    /// - Must not be a reserved name (`users`)
    ///
    /// # Example
    /// ```
    /// use wrangle_core::ContainerName;
    ///
    /// assert!(ContainerName::new("contacts").is_ok());
    /// assert!(ContainerName::new("9lives").is_err());
    /// assert!(ContainerName::new("users").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "table name" });
        }

        if s.len() > MAX_IDENTIFIER_LEN {
            return Err(ValidationError::TooLong {
                field: "table name",
                max: MAX_IDENTIFIER_LEN,
            });
        }

        if !IDENT_RE.is_match(s) {
            return Err(ValidationError::InvalidIdentifier {
                field: "table name",
                value: s.to_owned(),
            });
        }

        if RESERVED_CONTAINERS.contains(&s) {
            return Err(ValidationError::Reserved {
                field: "table name",
                value: s.to_owned(),
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Name of the fixed contacts table.
    pub fn contacts() -> Self {
        Self("contacts".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ContainerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(ContainerName::new("contacts").is_ok());
        assert!(ContainerName::new("_staging").is_ok());
        assert!(ContainerName::new("Orders2024").is_ok());
        assert!(ContainerName::new("a").is_ok());
    }

    #[test]
    fn rejects_leading_digit() {
        let err = ContainerName::new("1table").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { .. }));
    }

    #[test]
    fn rejects_punctuation() {
        for name in ["my table", "drop;table", "a-b", "x.y", "\"quoted\""] {
            let err = ContainerName::new(name).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidIdentifier { .. }),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty() {
        let err = ContainerName::new("").unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn rejects_reserved() {
        let err = ContainerName::new("users").unwrap_err();
        assert!(matches!(err, ValidationError::Reserved { .. }));
    }

    #[test]
    fn max_length() {
        assert!(ContainerName::new(&"t".repeat(63)).is_ok());
        let err = ContainerName::new(&"t".repeat(64)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 63, .. }));
    }

    #[test]
    fn identifier_helper() {
        assert!(is_valid_identifier("email"));
        assert!(!is_valid_identifier("e-mail"));
        assert!(!is_valid_identifier(""));
    }
}
