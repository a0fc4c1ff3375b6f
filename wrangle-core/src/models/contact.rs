//! Contact input validation
//!
//! Contacts live in the fixed `contacts` table (id, name, email).

use serde::Deserialize;

use super::ValidationError;

const MAX_CONTACT_FIELD_LEN: usize = 320;

fn check_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.len() > MAX_CONTACT_FIELD_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_CONTACT_FIELD_LEN,
        });
    }
    Ok(())
}

/// A contact about to be inserted. Both fields are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
}

impl NewContact {
    pub fn new(name: Option<String>, email: Option<String>) -> Result<Self, ValidationError> {
        let name = name.ok_or(ValidationError::Required { field: "name" })?;
        let email = email.ok_or(ValidationError::Required { field: "email" })?;
        check_field("name", &name)?;
        check_field("email", &email)?;
        Ok(Self { name, email })
    }
}

/// Partial contact update. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactPatch {
    /// Validate supplied fields; absent fields are fine.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if let Some(name) = &self.name {
            check_field("name", name)?;
        }
        if let Some(email) = &self.email {
            check_field("email", email)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_both_fields() {
        assert_eq!(
            NewContact::new(Some("Ada".into()), None).unwrap_err(),
            ValidationError::Required { field: "email" }
        );
        assert_eq!(
            NewContact::new(None, Some("ada@example.com".into())).unwrap_err(),
            ValidationError::Required { field: "name" }
        );
    }

    #[test]
    fn rejects_blank_values() {
        let err = NewContact::new(Some("  ".into()), Some("a@b.c".into())).unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "name" });
    }

    #[test]
    fn patch_validation() {
        let patch = ContactPatch {
            name: None,
            email: Some("ada.l@example.com".into()),
        };
        assert!(patch.clone().validate().is_ok());
        assert!(!patch.is_empty());

        let blank = ContactPatch {
            name: Some(String::new()),
            email: None,
        };
        assert!(blank.validate().is_err());
        assert!(ContactPatch::default().is_empty());
    }
}
