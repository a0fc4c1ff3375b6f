//! Contacts endpoints (relational variant only)

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use wrangle_core::{ContactPatch, NewContact};

use crate::http::error::ApiError;
use crate::http::extractors::{ContactId, ValidJson};
use crate::state::AppState;
use crate::store::{Contact, ContactStore};

/// Create contact request
#[derive(Deserialize)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct InitResponse {
    pub message: &'static str,
}

fn contacts(state: &AppState) -> Result<&dyn ContactStore, ApiError> {
    state.contacts().ok_or_else(|| ApiError::Internal {
        message: "contacts route mounted without a contact store".to_owned(),
    })
}

/// POST /init - create the contacts table
async fn init(State(state): State<AppState>) -> Result<Json<InitResponse>, ApiError> {
    contacts(&state)?.ensure_contacts().await?;
    Ok(Json(InitResponse {
        message: "contacts table is ready",
    }))
}

/// POST /contacts
async fn create_contact(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateContactRequest>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let contact = NewContact::new(req.name, req.email)?;
    let created = contacts(&state)?.create_contact(contact).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /contacts
async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(contacts(&state)?.list_contacts().await?))
}

/// GET /contacts/{id}
async fn get_contact(
    State(state): State<AppState>,
    ContactId(id): ContactId,
) -> Result<Json<Contact>, ApiError> {
    Ok(Json(contacts(&state)?.get_contact(id).await?))
}

/// PUT /contacts/{id} - only supplied fields change
async fn update_contact(
    State(state): State<AppState>,
    ContactId(id): ContactId,
    ValidJson(patch): ValidJson<ContactPatch>,
) -> Result<Json<Contact>, ApiError> {
    let patch = patch.validate()?;
    Ok(Json(contacts(&state)?.update_contact(id, patch).await?))
}

/// DELETE /contacts/{id} - returns the deleted row
async fn delete_contact(
    State(state): State<AppState>,
    ContactId(id): ContactId,
) -> Result<Json<Contact>, ApiError> {
    let deleted = contacts(&state)?.delete_contact(id).await?;
    tracing::info!(contact_id = deleted.id, "contact deleted");
    Ok(Json(deleted))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/init", post(init))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}
