//! Password hashing
//!
//! bcrypt is CPU-bound, so both operations run on tokio's blocking pool.

use bcrypt::{hash, verify};

use super::{AuthError, AuthResult};

/// Hash `password` with the given bcrypt cost.
///
/// # Errors
///
/// Returns `AuthError::Hashing` if bcrypt fails or the task is cancelled.
pub async fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {}", e)))?
}

/// Check `password` against a stored bcrypt hash.
///
/// `Ok(false)` means the password does not match. A malformed stored hash is
/// an error, not a mismatch.
pub async fn verify_password(password: &str, stored_hash: &str) -> AuthResult<bool> {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();

    tokio::task::spawn_blocking(move || {
        verify(password, &stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the tests fast
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("correct horse", TEST_COST).await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).await.unwrap());
        assert!(!verify_password("battery staple", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let a = hash_password("pw", TEST_COST).await.unwrap();
        let b = hash_password("pw", TEST_COST).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let err = verify_password("pw", "not-a-bcrypt-hash").await.unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }
}
