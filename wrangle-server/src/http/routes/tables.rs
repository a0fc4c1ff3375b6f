//! Table / collection management and the container view

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use wrangle_core::{parse_columns, ContainerName, ValidationError};

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidContainer, ValidJson};
use crate::state::AppState;
use crate::store::{Record, StoreKind, VIEW_ROW_LIMIT};

/// Create table request. `columns` is a `name:type, ...` list and is
/// ignored by the document store.
#[derive(Deserialize)]
pub struct CreateTableRequest {
    pub table_name: Option<String>,
    #[serde(default)]
    pub columns: Option<String>,
}

#[derive(Serialize)]
pub struct TableListResponse {
    pub kind: StoreKind,
    pub tables: Vec<String>,
}

#[derive(Serialize)]
pub struct TableCreatedResponse {
    pub table: String,
    pub message: &'static str,
}

/// Container view
#[derive(Serialize)]
pub struct TableViewResponse {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub pk_col: Option<String>,
}

/// GET /tables
async fn list_tables(State(state): State<AppState>) -> Result<Json<TableListResponse>, ApiError> {
    let containers = state.containers();
    Ok(Json(TableListResponse {
        kind: containers.kind(),
        tables: containers.list_containers().await?,
    }))
}

/// POST /tables - create if missing; existing tables are left as they are
async fn create_table(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateTableRequest>,
) -> Result<Json<TableCreatedResponse>, ApiError> {
    let user = session.require_user()?;
    let raw_name = req
        .table_name
        .ok_or(ValidationError::Required { field: "table name" })?;
    let name = ContainerName::new(raw_name.trim())?;
    let columns = parse_columns(req.columns.as_deref().unwrap_or_default())?;

    state.containers().ensure_container(&name, &columns).await?;
    tracing::info!(table = %name, user = %user.user_name, "table ensured");

    Ok(Json(TableCreatedResponse {
        table: name.into_string(),
        message: "table is ready",
    }))
}

/// GET /tables/{name}
async fn view_table(
    State(state): State<AppState>,
    ValidContainer(name): ValidContainer,
) -> Result<Json<TableViewResponse>, ApiError> {
    let containers = state.containers();
    let shape = containers.describe_container(&name).await?;
    let rows = containers.list_records(&name, VIEW_ROW_LIMIT).await?;

    Ok(Json(TableViewResponse {
        table: name.into_string(),
        columns: shape.columns,
        rows,
        pk_col: shape.primary_key,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables", get(list_tables).post(create_table))
        .route("/tables/{name}", get(view_table))
}
