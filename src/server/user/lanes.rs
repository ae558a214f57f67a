use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::access::{require_lane_access, require_stage_access};
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateLaneRequest, ReorderLanesRequest, UpdateLaneRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_display_name;
use crate::types::Lane;

/// New lanes always append at the end of the stage; the store computes the
/// position.
pub async fn create_lane(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLaneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Lane")?;
    let (_, sub) = require_stage_access(state.store.as_ref(), &auth.user, &req.stage_id)?;

    let now = Utc::now();
    let lane = Lane {
        id: Uuid::new_v4().to_string(),
        stage_id: req.stage_id,
        name: req.name,
        order: 0,
        created_at: now,
        updated_at: now,
    };

    let lane = state
        .store
        .append_lane(&lane)
        .api_err("Failed to create lane")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Created a lane | {}", lane.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(lane))))
}

pub async fn update_lane(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLaneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Lane")?;
    let (mut lane, sub) = require_lane_access(state.store.as_ref(), &auth.user, &id)?;

    lane.name = req.name;
    lane.updated_at = Utc::now();

    state
        .store
        .upsert_lane(&lane)
        .api_err("Failed to update lane")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated a lane | {}", lane.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(Json(ApiResponse::success(lane)))
}

pub async fn delete_lane(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (lane, sub) = require_lane_access(state.store.as_ref(), &auth.user, &id)?;

    let deleted = state
        .store
        .delete_lane(&id)
        .api_err("Failed to delete lane")?;

    if !deleted {
        return Err(ApiError::not_found("Lane not found"));
    }

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Deleted a lane | {}", lane.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Applies a full permutation of the stage's lanes. Partial or foreign
/// lists are rejected before anything moves.
pub async fn reorder_lanes(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReorderLanesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, sub) = require_stage_access(state.store.as_ref(), &auth.user, &id)?;

    state.store.reorder_lanes(&id, &req.lane_ids)?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        "Reordered lanes",
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}
