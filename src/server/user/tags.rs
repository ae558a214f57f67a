use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::access::{require_sub_sidiary_access, require_ticket_access};
use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CreateTagRequest, UpdateTagRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_display_name;
use crate::types::Tag;

pub async fn create_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Tag")?;
    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &req.sub_sidiary_id)?;

    let tag = Tag {
        id: Uuid::new_v4().to_string(),
        sub_sidiary_id: sub.id,
        name: req.name,
        color: req.color,
        created_at: Utc::now(),
    };

    match state.store.upsert_tag(&tag) {
        Ok(()) => {}
        Err(Error::Database(rusqlite::Error::SqliteFailure(err, _)))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(ApiError::conflict("A tag with this name already exists"));
        }
        Err(_) => return Err(ApiError::internal("Failed to create tag")),
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tag))))
}

pub async fn list_tags(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let tags = state
        .store
        .list_sub_sidiary_tags(&id)
        .api_err("Failed to list tags")?;

    Ok(Json(ApiResponse::success(tags)))
}

pub async fn update_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut tag = state
        .store
        .get_tag(&id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &tag.sub_sidiary_id)?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Tag")?;
        tag.name = name;
    }
    if let Some(color) = req.color {
        tag.color = color;
    }

    state
        .store
        .upsert_tag(&tag)
        .api_err("Failed to update tag")?;

    Ok(Json(ApiResponse::success(tag)))
}

pub async fn delete_tag(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .store
        .get_tag(&id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &tag.sub_sidiary_id)?;

    state
        .store
        .delete_tag(&id)
        .api_err("Failed to delete tag")?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces a ticket's tag set wholesale.
pub async fn set_ticket_tags(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(tag_ids): Json<Vec<String>>,
) -> Result<impl IntoResponse, ApiError> {
    let (ticket, sub) = require_ticket_access(state.store.as_ref(), &auth.user, &id)?;

    // Tags must belong to the same subsidiary as the ticket.
    for tag_id in &tag_ids {
        let tag = state
            .store
            .get_tag(tag_id)
            .api_err("Failed to get tag")?
            .or_not_found("Tag not found")?;
        if tag.sub_sidiary_id != sub.id {
            return Err(ApiError::bad_request(
                "Tag belongs to a different subsidiary",
            ));
        }
    }

    state
        .store
        .set_ticket_tags(&ticket.id, &tag_ids)
        .api_err("Failed to set ticket tags")?;

    let tags = state
        .store
        .list_ticket_tags(&ticket.id)
        .api_err("Failed to list ticket tags")?;

    Ok(Json(ApiResponse::success(tags)))
}
