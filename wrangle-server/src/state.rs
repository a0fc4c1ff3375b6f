//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use wrangle_core::config::MIN_SESSION_SECRET_LEN;
use wrangle_core::SessionConfig;

use crate::store::{AccountStore, ContactStore, ContainerStore, Stores};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    stores: Stores,
    cookie_key: Key,
    cookie_secure: bool,
    bcrypt_cost: u32,
}

impl AppState {
    pub fn new(stores: Stores, session: &SessionConfig, bcrypt_cost: u32) -> Self {
        let cookie_key = match &session.secret {
            Some(secret) if secret.len() >= MIN_SESSION_SECRET_LEN => {
                Key::derive_from(secret.as_bytes())
            }
            _ => {
                tracing::warn!(
                    "SESSION_SECRET not set; using a random key, sessions end when the process exits"
                );
                Key::generate()
            }
        };

        Self {
            inner: Arc::new(AppStateInner {
                stores,
                cookie_key,
                cookie_secure: session.secure_cookie,
                bcrypt_cost,
            }),
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    pub fn containers(&self) -> &dyn ContainerStore {
        self.inner.stores.containers.as_ref()
    }

    pub fn accounts(&self) -> &dyn AccountStore {
        self.inner.stores.accounts.as_ref()
    }

    /// `None` for the document variant, which has no contacts API.
    pub fn contacts(&self) -> Option<&dyn ContactStore> {
        self.inner.stores.contacts.as_deref()
    }

    pub fn cookie_secure(&self) -> bool {
        self.inner.cookie_secure
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.inner.bcrypt_cost
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.inner.cookie_key.clone()
    }
}
