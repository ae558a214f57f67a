use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireAdmin, TokenGenerator};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CreateTokenResponse, CreateUserTokenRequest, TokenResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::Token;

const TOKEN_CREATE_RETRIES: usize = 3;

fn token_response(token: &Token) -> TokenResponse {
    TokenResponse {
        id: token.id.clone(),
        is_admin: token.is_admin,
        user_id: token.user_id.clone(),
        created_at: token.created_at,
        expires_at: token.expires_at,
        last_used_at: token.last_used_at,
    }
}

/// Mints an access token for a user. The raw token is returned exactly once.
pub async fn create_user_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<CreateUserTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .get_user(&user_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let expires_at = req
        .expires_in_seconds
        .map(|secs| Utc::now() + Duration::seconds(secs));

    let generator = TokenGenerator::new();

    // Lookup collisions are rare but possible; retry with fresh randomness.
    for _ in 0..TOKEN_CREATE_RETRIES {
        let (raw_token, lookup, hash) = generator
            .generate()
            .map_err(|_| ApiError::internal("Failed to generate token"))?;

        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            is_admin: false,
            user_id: Some(user.id.clone()),
            created_at: Utc::now(),
            expires_at,
            last_used_at: None,
        };

        match state.store.create_token(&token) {
            Ok(()) => {
                return Ok((
                    StatusCode::CREATED,
                    Json(ApiResponse::success(CreateTokenResponse {
                        token: raw_token,
                        metadata: token_response(&token),
                    })),
                ));
            }
            Err(Error::TokenLookupCollision) => continue,
            Err(_) => return Err(ApiError::internal("Failed to store token")),
        }
    }

    Err(ApiError::internal("Failed to generate a unique token"))
}

pub async fn list_user_tokens(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state
        .store
        .list_user_tokens(&user_id)
        .api_err("Failed to list tokens")?;

    let tokens: Vec<TokenResponse> = tokens.iter().map(token_response).collect();
    Ok(Json(ApiResponse::success(tokens)))
}

pub async fn get_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .store
        .get_token_by_id(&id)
        .api_err("Failed to get token")?
        .or_not_found("Token not found")?;

    Ok(Json(ApiResponse::success(token_response(&token))))
}

pub async fn delete_token(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_token(&id)
        .api_err("Failed to delete token")?;

    if !deleted {
        return Err(ApiError::not_found("Token not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
