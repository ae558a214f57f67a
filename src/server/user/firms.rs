use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use super::access::{require_firm_access, require_firm_membership};
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{UpdateFirmGoalRequest, UpdateFirmRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_display_name, validate_email};
use crate::types::Role;

pub async fn get_firm(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_membership(&auth.user, &id)?;

    let firm = state
        .store
        .get_firm(&id)
        .api_err("Failed to get firm")?
        .or_not_found("Firm not found")?;

    Ok(Json(ApiResponse::success(firm)))
}

pub async fn update_firm(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_access(&auth.user, &id)?;

    let mut firm = state
        .store
        .get_firm(&id)
        .api_err("Failed to get firm")?
        .or_not_found("Firm not found")?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Firm")?;
        firm.name = name;
    }
    if let Some(email) = req.company_email {
        validate_email(&email)?;
        firm.company_email = email;
    }
    if let Some(white_label) = req.white_label {
        firm.white_label = white_label;
    }
    firm.company_phone = req.company_phone.or(firm.company_phone);
    firm.address = req.address.or(firm.address);
    firm.city = req.city.or(firm.city);
    firm.zip_code = req.zip_code.or(firm.zip_code);
    firm.state = req.state.or(firm.state);
    firm.country = req.country.or(firm.country);
    firm.logo = req.logo.or(firm.logo);
    firm.customer_id = req.customer_id.or(firm.customer_id);
    firm.updated_at = Utc::now();

    state
        .store
        .upsert_firm(&firm)
        .api_err("Failed to update firm")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        "Updated firm details",
        Some(&firm.id),
        None,
    );

    Ok(Json(ApiResponse::success(firm)))
}

pub async fn update_goal(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFirmGoalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_access(&auth.user, &id)?;

    if req.goal < 0 {
        return Err(ApiError::bad_request("Goal cannot be negative"));
    }

    let mut firm = state
        .store
        .get_firm(&id)
        .api_err("Failed to get firm")?
        .or_not_found("Firm not found")?;

    firm.goal = req.goal;
    firm.updated_at = Utc::now();

    state
        .store
        .upsert_firm(&firm)
        .api_err("Failed to update firm goal")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated the firm goal to | {} subsidiaries", firm.goal),
        Some(&firm.id),
        None,
    );

    Ok(Json(ApiResponse::success(firm)))
}

/// Deleting a firm is restricted to its owner, not admins.
pub async fn delete_firm(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user.role != Role::FirmOwner || auth.user.firm_id.as_deref() != Some(id.as_str()) {
        return Err(ApiError::forbidden("Only the firm owner can delete it"));
    }

    let deleted = state
        .store
        .delete_firm(&id)
        .api_err("Failed to delete firm")?;

    if !deleted {
        return Err(ApiError::not_found("Firm not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_notifications(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_membership(&auth.user, &id)?;

    let notifications = state
        .store
        .list_firm_notifications(&id)
        .api_err("Failed to list notifications")?;

    Ok(Json(ApiResponse::success(notifications)))
}

pub async fn get_subscription(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_access(&auth.user, &id)?;

    let subscription = state
        .store
        .get_firm_subscription(&id)
        .api_err("Failed to get subscription")?;

    Ok(Json(ApiResponse::success(subscription)))
}

pub async fn list_team(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_membership(&auth.user, &id)?;

    let users = state
        .store
        .list_firm_users(&id)
        .api_err("Failed to list team")?;

    Ok(Json(ApiResponse::success(users)))
}
