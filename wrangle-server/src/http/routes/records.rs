//! Record CRUD inside a table or collection
//!
//! Reads are public; writes need a signed-in session.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use wrangle_core::Fields;

use crate::auth::Session;
use crate::http::error::ApiError;
use crate::http::extractors::{RecordPath, ValidContainer, ValidJson};
use crate::state::AppState;
use crate::store::{Record, StoreKind, VIEW_ROW_LIMIT};

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
    pub id: String,
}

/// Form-style `<field>_type` hints apply to new documents only. Updates are
/// stored exactly as sent, so empty strings, nulls and `*_type` keys survive.
fn prepare_new_record(kind: StoreKind, fields: Fields) -> Fields {
    match kind {
        StoreKind::Document => fields.apply_type_hints(),
        StoreKind::Relational => fields,
    }
}

/// POST /tables/{name}/rows
async fn create_record(
    State(state): State<AppState>,
    session: Session,
    ValidContainer(name): ValidContainer,
    ValidJson(fields): ValidJson<Fields>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    session.require_user()?;
    let containers = state.containers();
    let fields = prepare_new_record(containers.kind(), fields);
    let record = containers.insert_record(&name, fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /tables/{name}/rows
async fn list_records(
    State(state): State<AppState>,
    ValidContainer(name): ValidContainer,
) -> Result<Json<Vec<Record>>, ApiError> {
    let rows = state
        .containers()
        .list_records(&name, VIEW_ROW_LIMIT)
        .await?;
    Ok(Json(rows))
}

/// GET /tables/{name}/rows/{id}
async fn get_record(
    State(state): State<AppState>,
    path: RecordPath,
) -> Result<Json<Record>, ApiError> {
    let record = state
        .containers()
        .get_record(&path.container, &path.id)
        .await?;
    Ok(Json(record))
}

/// PUT /tables/{name}/rows/{id} - only supplied fields change
async fn update_record(
    State(state): State<AppState>,
    session: Session,
    path: RecordPath,
    ValidJson(fields): ValidJson<Fields>,
) -> Result<Json<Record>, ApiError> {
    session.require_user()?;
    let record = state
        .containers()
        .update_record(&path.container, &path.id, fields)
        .await?;
    Ok(Json(record))
}

/// DELETE /tables/{name}/rows/{id}
async fn delete_record(
    State(state): State<AppState>,
    session: Session,
    path: RecordPath,
) -> Result<Json<DeletedResponse>, ApiError> {
    let user = session.require_user()?;
    state
        .containers()
        .delete_record(&path.container, &path.id)
        .await?;
    tracing::info!(table = %path.container, id = %path.id, user = %user.user_name, "record deleted");

    Ok(Json(DeletedResponse {
        deleted: true,
        id: path.id,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables/{name}/rows", get(list_records).post(create_record))
        .route(
            "/tables/{name}/rows/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrangle_core::FieldValue;

    fn form(pairs: &[(&str, &str)]) -> Fields {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn document_records_get_type_hints() {
        let fields = form(&[("age", "42"), ("age_type", "number"), ("nick", "")]);
        let prepared = prepare_new_record(StoreKind::Document, fields);
        assert_eq!(prepared.get("age"), Some(&FieldValue::Int(42)));
        assert!(!prepared.contains_key("age_type"));
        assert!(!prepared.contains_key("nick"));
    }

    #[test]
    fn relational_records_pass_through() {
        let fields = form(&[("age", "42"), ("age_type", "number")]);
        let prepared = prepare_new_record(StoreKind::Relational, fields.clone());
        assert_eq!(prepared, fields);
    }
}
