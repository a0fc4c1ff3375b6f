//! Column declarations for relational containers
//!
//! Parsed from a comma-separated `name:type` list, e.g.
//! `title:text, pages:int, read:bool`. A missing type means `text`.
//! Every table also gets `id SERIAL PRIMARY KEY`, so `id` cannot be declared.

use std::collections::HashSet;

use super::container::is_valid_identifier;
use super::ValidationError;

/// Supported column types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// Parse a user-facing type name (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "boolean" | "bool" => Ok(Self::Boolean),
            "timestamp" => Ok(Self::Timestamp),
            _ => Err(ValidationError::InvalidVariant {
                field: "column type",
                value: s.trim().to_owned(),
            }),
        }
    }

    /// Postgres type used in `CREATE TABLE`.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMPTZ",
        }
    }
}

/// A single declared column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnDef {
    pub fn new(name: &str, ty: ColumnType) -> Result<Self, ValidationError> {
        if !is_valid_identifier(name) {
            return Err(ValidationError::InvalidIdentifier {
                field: "column name",
                value: name.to_owned(),
            });
        }
        if name.eq_ignore_ascii_case("id") {
            return Err(ValidationError::Reserved {
                field: "column name",
                value: name.to_owned(),
            });
        }
        Ok(Self {
            name: name.to_owned(),
            ty,
        })
    }
}

/// Parse a column list. Empty input yields no columns.
pub fn parse_columns(raw: &str) -> Result<Vec<ColumnDef>, ValidationError> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, ty) = match part.split_once(':') {
            Some((name, ty)) => (name.trim(), ColumnType::parse(ty)?),
            None => (part, ColumnType::Text),
        };

        let column = ColumnDef::new(name, ty)?;
        if !seen.insert(column.name.to_ascii_lowercase()) {
            return Err(ValidationError::Duplicate {
                field: "column name",
                value: column.name,
            });
        }
        columns.push(column);
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_and_untyped_columns() {
        let cols = parse_columns("title:text, pages:int,read: BOOL , note").unwrap();
        assert_eq!(
            cols,
            vec![
                ColumnDef { name: "title".into(), ty: ColumnType::Text },
                ColumnDef { name: "pages".into(), ty: ColumnType::Integer },
                ColumnDef { name: "read".into(), ty: ColumnType::Boolean },
                ColumnDef { name: "note".into(), ty: ColumnType::Text },
            ]
        );
    }

    #[test]
    fn empty_input_has_no_columns() {
        assert!(parse_columns("").unwrap().is_empty());
        assert!(parse_columns(" , ,").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_type() {
        let err = parse_columns("price:money").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidVariant {
                field: "column type",
                value: "money".into()
            }
        );
    }

    #[test]
    fn rejects_bad_column_name() {
        let err = parse_columns("ok:text, not ok:text").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { .. }));
    }

    #[test]
    fn rejects_id_and_duplicates() {
        assert!(matches!(
            parse_columns("id:int").unwrap_err(),
            ValidationError::Reserved { .. }
        ));
        assert!(matches!(
            parse_columns("name, Name:text").unwrap_err(),
            ValidationError::Duplicate { .. }
        ));
    }

    #[test]
    fn timestamp_maps_to_timestamptz() {
        assert_eq!(ColumnType::parse("timestamp").unwrap().sql_type(), "TIMESTAMPTZ");
    }
}
