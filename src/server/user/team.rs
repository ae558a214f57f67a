use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use super::access::require_firm_access;
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::UpdateMemberRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::Role;

/// Updates a team member's details. The owner role can neither be assigned
/// nor taken away here.
pub async fn update_member(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut member = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let firm_id = member
        .firm_id
        .clone()
        .or_not_found("User not found")?;
    require_firm_access(&auth.user, &firm_id)?;

    if let Some(role) = req.role {
        if role == Role::FirmOwner || member.role == Role::FirmOwner {
            return Err(ApiError::bad_request("Cannot change the owner role"));
        }
        member.role = role;
    }
    if let Some(name) = req.name {
        member.name = name;
    }
    member.avatar_url = req.avatar_url.or(member.avatar_url);
    member.updated_at = Utc::now();

    state
        .store
        .update_user(&member)
        .api_err("Failed to update user")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated team member | {}", member.name),
        Some(&firm_id),
        None,
    );

    Ok(Json(ApiResponse::success(member)))
}

/// Removes a member from the firm, along with their tokens, permission
/// grants, and ticket assignments. The owner cannot be removed.
pub async fn remove_member(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state
        .store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let firm_id = member
        .firm_id
        .clone()
        .or_not_found("User not found")?;
    require_firm_access(&auth.user, &firm_id)?;

    if member.role == Role::FirmOwner {
        return Err(ApiError::bad_request("Cannot remove the firm owner"));
    }

    let deleted = state
        .store
        .delete_user(&id)
        .api_err("Failed to remove user")?;

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Removed {} from the team", member.email),
        Some(&firm_id),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}
