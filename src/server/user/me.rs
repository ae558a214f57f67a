use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use super::access::visible_sub_sidiaries;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::AuthenticatedUserView;

/// The authenticated-user view the client boots from: identity, firm,
/// reachable subsidiaries, raw permission rows, and the firm sidebar.
pub async fn get_me(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = auth.user;

    let firm = match user.firm_id.as_deref() {
        Some(firm_id) => state.store.get_firm(firm_id).api_err("Failed to get firm")?,
        None => None,
    };

    let sub_sidiaries = visible_sub_sidiaries(state.store.as_ref(), &user)?;

    let permissions = state
        .store
        .list_user_permissions(&user.email)
        .api_err("Failed to list permissions")?;

    let firm_sidebar = match firm.as_ref() {
        Some(firm) => state
            .store
            .list_firm_sidebar_options(&firm.id)
            .api_err("Failed to list sidebar options")?,
        None => vec![],
    };

    Ok(Json(ApiResponse::success(AuthenticatedUserView {
        user,
        firm,
        sub_sidiaries,
        permissions,
        firm_sidebar,
    })))
}
