use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::CreateInvitationRequest;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_email;
use crate::types::{Invitation, InvitationStatus, Role};

/// Invitations are always issued by a firm owner or admin for their own
/// firm, and only for non-owner roles.
pub async fn create_invitation(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&req.email)?;

    if !auth.user.role.is_firm_level() {
        return Err(ApiError::forbidden("Firm access required"));
    }
    let Some(firm_id) = auth.user.firm_id.clone() else {
        return Err(ApiError::forbidden("Firm access required"));
    };

    let role = req.role.unwrap_or(Role::SubsidiaryUser);
    if role == Role::FirmOwner {
        return Err(ApiError::bad_request("Cannot invite a firm owner"));
    }

    let existing = state
        .store
        .get_user_by_email(&req.email)
        .api_err("Failed to check existing user")?;
    if existing.is_some() {
        return Err(ApiError::conflict("User is already a member"));
    }

    let invitation = Invitation {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        firm_id: firm_id.clone(),
        role,
        status: InvitationStatus::Pending,
        created_at: Utc::now(),
    };

    match state.store.create_invitation(&invitation) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::conflict("An invitation for this email is pending"));
        }
        Err(_) => return Err(ApiError::internal("Failed to create invitation")),
    }

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Invited {}", invitation.email),
        Some(&firm_id),
        None,
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(invitation))))
}

pub async fn revoke_invitation(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !auth.user.role.is_firm_level() {
        return Err(ApiError::forbidden("Firm access required"));
    }

    let invitation = state
        .store
        .get_pending_invitation(&email)
        .api_err("Failed to get invitation")?;

    match invitation {
        Some(inv) if Some(inv.firm_id.as_str()) == auth.user.firm_id.as_deref() => {
            state
                .store
                .delete_invitation(&email)
                .api_err("Failed to revoke invitation")?;
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(ApiError::not_found("Invitation not found")),
    }
}
