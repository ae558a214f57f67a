use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::audit::log_activity;
use crate::auth::RequireAdmin;
use crate::error::Result as StoreResult;
use crate::server::AppState;
use crate::server::dto::{AcceptInvitationRequest, AcceptInvitationResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::{validate_display_name, validate_email};
use crate::store::Store;
use crate::types::User;

/// Resolves an invited email into a member account.
///
/// A pending invitation creates the user with the invited role, records the
/// join, and burns the invitation so a repeat call falls through to the
/// plain email lookup. Already-registered emails resolve to their existing
/// membership; unknown emails resolve to nothing.
pub fn accept_invitation(
    store: &dyn Store,
    email: &str,
    name: &str,
    avatar_url: Option<&str>,
) -> StoreResult<(Option<String>, Option<User>)> {
    if let Some(invitation) = store.get_pending_invitation(email)? {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: invitation.email.clone(),
            name: name.to_string(),
            avatar_url: avatar_url.map(String::from),
            role: invitation.role,
            firm_id: Some(invitation.firm_id.clone()),
            created_at: now,
            updated_at: now,
        };
        store.create_user(&user)?;

        log_activity(store, Some(&user), "Joined", Some(&invitation.firm_id), None);

        store.delete_invitation(email)?;
        return Ok((Some(invitation.firm_id), Some(user)));
    }

    match store.get_user_by_email(email)? {
        Some(user) => Ok((user.firm_id.clone(), Some(user))),
        None => Ok((None, None)),
    }
}

pub async fn accept_invitation_route(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&req.email)?;
    validate_display_name(&req.name, "User")?;

    let (firm_id, user) = accept_invitation(
        state.store.as_ref(),
        &req.email,
        &req.name,
        req.avatar_url.as_deref(),
    )
    .api_err("Failed to accept invitation")?;

    let status = if user.is_some() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    Ok((
        status,
        Json(ApiResponse::success(AcceptInvitationResponse {
            firm_id,
            user,
        })),
    ))
}
