use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::access::require_sub_sidiary_access;
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{ContactSearchParams, CreateContactRequest, UpdateContactRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_display_name, validate_email};
use crate::types::Contact;

pub async fn create_contact(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Contact")?;
    validate_email(&req.email)?;

    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &req.sub_sidiary_id)?;

    let contact = Contact {
        id: Uuid::new_v4().to_string(),
        sub_sidiary_id: sub.id.clone(),
        name: req.name,
        email: req.email,
        created_at: Utc::now(),
    };

    state
        .store
        .upsert_contact(&contact)
        .api_err("Failed to create contact")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Created a contact | {}", contact.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(contact))))
}

pub async fn list_contacts(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ContactSearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let contacts = match params.search.as_deref() {
        Some(term) if !term.is_empty() => state
            .store
            .search_contacts(&id, term)
            .api_err("Failed to search contacts")?,
        _ => state
            .store
            .list_sub_sidiary_contacts(&id)
            .api_err("Failed to list contacts")?,
    };

    Ok(Json(ApiResponse::success(contacts)))
}

pub async fn update_contact(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut contact = state
        .store
        .get_contact(&id)
        .api_err("Failed to get contact")?
        .or_not_found("Contact not found")?;

    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &contact.sub_sidiary_id)?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Contact")?;
        contact.name = name;
    }
    if let Some(email) = req.email {
        validate_email(&email)?;
        contact.email = email;
    }

    state
        .store
        .upsert_contact(&contact)
        .api_err("Failed to update contact")?;

    Ok(Json(ApiResponse::success(contact)))
}

pub async fn delete_contact(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = state
        .store
        .get_contact(&id)
        .api_err("Failed to get contact")?
        .or_not_found("Contact not found")?;

    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &contact.sub_sidiary_id)?;

    state
        .store
        .delete_contact(&id)
        .api_err("Failed to delete contact")?;

    Ok(StatusCode::NO_CONTENT)
}
