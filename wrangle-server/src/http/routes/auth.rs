//! Signup, login and logout

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use wrangle_core::Credentials;

use crate::auth::{AuthService, Session, SessionUser};
use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::state::AppState;
use crate::store::Account;

/// Signup / login request. Missing fields are reported as validation errors.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /signup - create an account and sign it in
async fn signup(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CredentialsRequest>,
) -> Result<(StatusCode, Session, Json<Account>), ApiError> {
    let credentials = Credentials::new(req.name, req.password)?;
    let account = AuthService::new(state.accounts(), state.bcrypt_cost())
        .signup(&credentials)
        .await?;

    let session = session.sign_in(&SessionUser::from(&account))?;
    Ok((StatusCode::CREATED, session, Json(account)))
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CredentialsRequest>,
) -> Result<(Session, Json<Account>), ApiError> {
    let credentials = Credentials::new(req.name, req.password)?;
    let account = AuthService::new(state.accounts(), state.bcrypt_cost())
        .login(&credentials)
        .await?;

    tracing::info!(user = %account.name, "signed in");
    let session = session.sign_in(&SessionUser::from(&account))?;
    Ok((session, Json(account)))
}

/// POST /logout - always succeeds
async fn logout(session: Session) -> (Session, Json<MessageResponse>) {
    (
        session.clear(),
        Json(MessageResponse {
            message: "logged out",
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}
