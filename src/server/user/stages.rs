use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::access::{require_stage_access, require_sub_sidiary_access};
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::pipeline::stage_value_summary;
use crate::server::AppState;
use crate::server::dto::{CreateStageRequest, StageBoardResponse, UpdateStageRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_display_name;
use crate::types::Stage;

pub async fn create_stage(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateStageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Stage")?;
    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &req.sub_sidiary_id)?;

    let now = Utc::now();
    let stage = Stage {
        id: Uuid::new_v4().to_string(),
        sub_sidiary_id: sub.id.clone(),
        name: req.name,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .upsert_stage(&stage)
        .api_err("Failed to create stage")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Created a pipeline stage | {}", stage.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(stage))))
}

/// A subsidiary visited before any stage exists gets "First Stage" created
/// on the spot, so the pipeline view always has somewhere to land.
pub async fn list_stages(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let mut stages = state
        .store
        .list_sub_sidiary_stages(&id)
        .api_err("Failed to list stages")?;

    if stages.is_empty() {
        let now = Utc::now();
        let stage = Stage {
            id: Uuid::new_v4().to_string(),
            sub_sidiary_id: sub.id,
            name: "First Stage".to_string(),
            created_at: now,
            updated_at: now,
        };
        state
            .store
            .upsert_stage(&stage)
            .api_err("Failed to create default stage")?;
        stages.push(stage);
    }

    Ok(Json(ApiResponse::success(stages)))
}

/// The full board: lanes in order, tickets in order with their relations,
/// and the open/closed value rollup.
pub async fn get_board(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_stage_access(state.store.as_ref(), &auth.user, &id)?;

    let lanes = state
        .store
        .list_lanes_with_tickets(&id)
        .api_err("Failed to load board")?;

    let summary = stage_value_summary(&lanes);

    Ok(Json(ApiResponse::success(StageBoardResponse {
        lanes,
        summary,
    })))
}

pub async fn update_stage(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Stage")?;
    let (mut stage, sub) = require_stage_access(state.store.as_ref(), &auth.user, &id)?;

    stage.name = req.name;
    stage.updated_at = Utc::now();

    state
        .store
        .upsert_stage(&stage)
        .api_err("Failed to update stage")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated a pipeline stage | {}", stage.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(Json(ApiResponse::success(stage)))
}

pub async fn delete_stage(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (stage, sub) = require_stage_access(state.store.as_ref(), &auth.user, &id)?;

    let deleted = state
        .store
        .delete_stage(&id)
        .api_err("Failed to delete stage")?;

    if !deleted {
        return Err(ApiError::not_found("Stage not found"));
    }

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Deleted a pipeline stage | {}", stage.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}
