//! Signup / login credentials

use std::fmt;

use super::ValidationError;

const MAX_NAME_LEN: usize = 128;

/// bcrypt only looks at the first 72 bytes of a password
const MAX_PASSWORD_BYTES: usize = 72;

/// Validated name + password pair
#[derive(Clone)]
pub struct Credentials {
    name: String,
    password: String,
}

impl Credentials {
    pub fn new(name: Option<String>, password: Option<String>) -> Result<Self, ValidationError> {
        let name = name.unwrap_or_default();
        let password = password.unwrap_or_default();

        if name.is_empty() {
            return Err(ValidationError::Required { field: "name" });
        }
        if password.is_empty() {
            return Err(ValidationError::Required { field: "password" });
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_BYTES,
            });
        }

        Ok(Self { name, password })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fields_required() {
        assert_eq!(
            Credentials::new(None, Some("pw".into())).unwrap_err(),
            ValidationError::Required { field: "name" }
        );
        assert_eq!(
            Credentials::new(Some("ada".into()), Some(String::new())).unwrap_err(),
            ValidationError::Required { field: "password" }
        );
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new(Some("ada".into()), Some("hunter2".into())).unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("ada"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn long_password_rejected() {
        let err = Credentials::new(Some("ada".into()), Some("x".repeat(73))).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "password", .. }));
    }
}
