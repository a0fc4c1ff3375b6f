//! Liveness endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::store::StoreKind;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Layout of the configured store; does not touch the database
    pub store: StoreKind,
}

fn report(store: StoreKind) -> HealthResponse {
    HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store,
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(report(state.containers().kind()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_version_and_store_kind() {
        let body = serde_json::to_value(report(StoreKind::Document)).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["store"], "document");
    }
}
