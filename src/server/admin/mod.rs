mod firms;
mod tokens;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub use users::accept_invitation;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Firm provisioning
        .route("/firms", post(firms::create_firm))
        .route("/firms", get(firms::list_firms))
        .route("/firms/{id}", get(firms::get_firm))
        .route("/firms/{id}", delete(firms::delete_firm))
        // Onboarding
        .route("/invitations/accept", post(users::accept_invitation_route))
        // Token routes
        .route("/users/{id}/tokens", post(tokens::create_user_token))
        .route("/users/{id}/tokens", get(tokens::list_user_tokens))
        .route("/tokens/{id}", get(tokens::get_token))
        .route("/tokens/{id}", delete(tokens::delete_token))
}
