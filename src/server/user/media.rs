use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::access::require_sub_sidiary_access;
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::CreateMediaRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_display_name;
use crate::types::Media;

pub async fn create_media(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Media")?;
    if req.link.is_empty() {
        return Err(ApiError::bad_request("Media link cannot be empty"));
    }

    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &req.sub_sidiary_id)?;

    let media = Media {
        id: Uuid::new_v4().to_string(),
        sub_sidiary_id: sub.id.clone(),
        name: req.name,
        link: req.link,
        created_at: Utc::now(),
    };

    state
        .store
        .create_media(&media)
        .api_err("Failed to create media")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Uploaded a media file | {}", media.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(media))))
}

pub async fn list_media(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let media = state
        .store
        .list_sub_sidiary_media(&id)
        .api_err("Failed to list media")?;

    Ok(Json(ApiResponse::success(media)))
}

pub async fn delete_media(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let media = state
        .store
        .get_media(&id)
        .api_err("Failed to get media")?
        .or_not_found("Media not found")?;

    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &media.sub_sidiary_id)?;

    state
        .store
        .delete_media(&id)
        .api_err("Failed to delete media")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Deleted a media file | {}", media.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}
