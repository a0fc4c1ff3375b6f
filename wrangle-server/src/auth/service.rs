//! Signup and login

use tokio::sync::OnceCell;
use wrangle_core::Credentials;

use super::password::{hash_password, verify_password};
use super::{AuthError, AuthResult};
use crate::store::{Account, AccountStore};

/// Hash checked when the account does not exist, so an unknown name costs
/// one bcrypt verification just like a wrong password.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

async fn dummy_hash(cost: u32) -> AuthResult<&'static str> {
    DUMMY_HASH
        .get_or_try_init(|| hash_password("wrangle-dummy-password", cost))
        .await
        .map(String::as_str)
}

/// Account operations over any `AccountStore`
pub struct AuthService<'a> {
    accounts: &'a dyn AccountStore,
    bcrypt_cost: u32,
}

impl<'a> AuthService<'a> {
    pub fn new(accounts: &'a dyn AccountStore, bcrypt_cost: u32) -> Self {
        Self {
            accounts,
            bcrypt_cost,
        }
    }

    /// Create an account. A taken name fails with a duplicate error and the
    /// existing account is not touched.
    pub async fn signup(&self, credentials: &Credentials) -> AuthResult<Account> {
        let hashed = hash_password(credentials.password(), self.bcrypt_cost).await?;
        let account = self
            .accounts
            .create_account(credentials.name(), &hashed)
            .await?;
        tracing::info!(user = %account.name, "account created");
        Ok(account)
    }

    /// Check credentials. Unknown name and wrong password both yield
    /// `AuthError::InvalidCredentials`.
    pub async fn login(&self, credentials: &Credentials) -> AuthResult<Account> {
        let Some(stored) = self.accounts.find_account(credentials.name()).await? else {
            if let Ok(hash) = dummy_hash(self.bcrypt_cost).await {
                let _ = verify_password(credentials.password(), hash).await;
            }
            return Err(AuthError::InvalidCredentials);
        };

        match verify_password(credentials.password(), &stored.password_hash).await {
            Ok(true) => Ok(stored.account),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::warn!(user = %stored.account.name, error = %e, "stored password hash is unusable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    fn creds(name: &str, password: &str) -> Credentials {
        Credentials::new(Some(name.into()), Some(password.into())).unwrap()
    }

    #[tokio::test]
    async fn signup_then_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, 4);

        let created = auth.signup(&creds("ada", "s3cret")).await.unwrap();
        let logged_in = auth.login(&creds("ada", "s3cret")).await.unwrap();
        assert_eq!(created, logged_in);
    }

    #[tokio::test]
    async fn duplicate_signup_keeps_original_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, 4);

        auth.signup(&creds("ada", "first")).await.unwrap();
        let err = auth.signup(&creds("ada", "second")).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::Duplicate(_))));

        assert!(auth.login(&creds("ada", "first")).await.is_ok());
        assert!(matches!(
            auth.login(&creds("ada", "second")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, 4);
        auth.signup(&creds("ada", "s3cret")).await.unwrap();

        let wrong_password = auth.login(&creds("ada", "nope")).await.unwrap_err();
        let unknown_user = auth.login(&creds("grace", "s3cret")).await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(unknown_user.to_string(), "invalid credentials");
    }

    #[tokio::test]
    async fn unknown_name_still_verifies_a_hash() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store, 4);

        assert!(matches!(
            auth.login(&creds("nobody", "whatever")).await,
            Err(AuthError::InvalidCredentials)
        ));
        let hash = DUMMY_HASH.get().expect("dummy hash initialised by login");
        assert!(hash.starts_with("$2"));
        assert!(!verify_password("whatever", hash).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_rejected() {
        let store = MemoryStore::new();
        store.create_account("ada", "garbage").await.unwrap();
        let auth = AuthService::new(&store, 4);

        assert!(matches!(
            auth.login(&creds("ada", "anything")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
