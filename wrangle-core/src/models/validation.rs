//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field was not supplied at all
    Required { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Identifier (table, collection or column name) is malformed
    InvalidIdentifier { field: &'static str, value: String },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Name is reserved for internal use
    Reserved { field: &'static str, value: String },

    /// Same name declared twice
    Duplicate { field: &'static str, value: String },

    /// The store refused the input (bad type, unknown column, ...)
    Rejected { reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::Required { field } => write!(f, "{} is required", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::InvalidIdentifier { field, value } => write!(
                f,
                "invalid {} '{}': use letters, digits, underscore; start with letter/_",
                field, value
            ),
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::Reserved { field, value } => write!(f, "{} '{}' is reserved", field, value),
            Self::Duplicate { field, value } => {
                write!(f, "{} '{}' is declared more than once", field, value)
            }
            Self::Rejected { reason } => f.write_str(reason),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "table name",
            max: 63,
        };
        assert_eq!(
            err.to_string(),
            "table name exceeds maximum length of 63 characters"
        );
    }

    #[test]
    fn identifier_error_names_the_value() {
        let err = ValidationError::InvalidIdentifier {
            field: "column name",
            value: "1st".into(),
        };
        assert!(err.to_string().contains("'1st'"));
    }
}
