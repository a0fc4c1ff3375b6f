//! Session cookie
//!
//! The signed-in user lives in a private (encrypted and authenticated)
//! cookie, so there is no server-side session table. A tampered or
//! foreign cookie simply reads as "not signed in".

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::http::ApiError;
use crate::state::AppState;
use crate::store::Account;

pub const SESSION_COOKIE: &str = "wrangle_session";

/// What the session remembers about the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: String,
    pub user_name: String,
}

impl From<&Account> for SessionUser {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.id.clone(),
            user_name: account.name.clone(),
        }
    }
}

/// Session extractor. Return it from a handler to persist changes.
pub struct Session {
    jar: PrivateCookieJar,
    secure: bool,
}

impl Session {
    pub fn user(&self) -> Option<SessionUser> {
        let cookie = self.jar.get(SESSION_COOKIE)?;
        serde_json::from_str(cookie.value()).ok()
    }

    /// The signed-in user, or 401.
    pub fn require_user(&self) -> Result<SessionUser, ApiError> {
        self.user().ok_or_else(|| ApiError::Unauthorized {
            message: "please log in".to_owned(),
        })
    }

    pub fn sign_in(self, user: &SessionUser) -> Result<Self, ApiError> {
        let value = serde_json::to_string(user).map_err(|e| ApiError::Internal {
            message: format!("session encode: {}", e),
        })?;
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        Ok(Self {
            jar: self.jar.add(cookie),
            secure: self.secure,
        })
    }

    pub fn clear(self) -> Self {
        Self {
            jar: self.jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
            secure: self.secure,
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_request_parts(parts, state).await?;
        Ok(Self {
            jar,
            secure: state.cookie_secure(),
        })
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.jar.into_response_parts(res)
    }
}
