//! Dashboard and current-session endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::auth::{Session, SessionUser};
use crate::http::error::ApiError;
use crate::state::AppState;
use crate::store::StoreKind;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user_name: Option<String>,
    pub kind: StoreKind,
    pub tables: Vec<String>,
}

/// GET / - signed-in user and the container list.
///
/// The page still renders when storage is down; the list is just empty.
async fn dashboard(State(state): State<AppState>, session: Session) -> Json<DashboardResponse> {
    let tables = match state.containers().list_containers().await {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!(error = %e, "could not list containers for dashboard");
            Vec::new()
        }
    };

    Json(DashboardResponse {
        user_name: session.user().map(|u| u.user_name),
        kind: state.containers().kind(),
        tables,
    })
}

/// GET /session
async fn current_session(session: Session) -> Result<Json<SessionUser>, ApiError> {
    Ok(Json(session.require_user()?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/session", get(current_session))
}
