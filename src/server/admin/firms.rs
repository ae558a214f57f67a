use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateFirmRequest, CreateFirmResponse, PaginationParams};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
    paginate,
};
use crate::server::sidebar::default_firm_options;
use crate::server::validation::{validate_display_name, validate_email};
use crate::types::{Firm, Role, User};

const DEFAULT_SUB_SIDIARY_GOAL: i64 = 5;

/// Provisions a firm together with its owner account and default sidebar.
pub async fn create_firm(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Firm")?;
    validate_email(&req.company_email)?;
    validate_email(&req.owner.email)?;
    validate_display_name(&req.owner.name, "Owner")?;

    let existing = state
        .store
        .get_user_by_email(&req.owner.email)
        .api_err("Failed to check existing owner")?;
    if existing.is_some() {
        return Err(ApiError::conflict("Owner email is already registered"));
    }

    let now = Utc::now();
    let firm = Firm {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        company_email: req.company_email,
        company_phone: req.company_phone,
        white_label: req.white_label,
        address: None,
        city: None,
        zip_code: None,
        state: None,
        country: None,
        logo: None,
        customer_id: None,
        goal: req.goal.unwrap_or(DEFAULT_SUB_SIDIARY_GOAL),
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .upsert_firm(&firm)
        .api_err("Failed to create firm")?;

    let owner = User {
        id: Uuid::new_v4().to_string(),
        email: req.owner.email,
        name: req.owner.name,
        avatar_url: req.owner.avatar_url,
        role: Role::FirmOwner,
        firm_id: Some(firm.id.clone()),
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .create_user(&owner)
        .api_err("Failed to create firm owner")?;

    state
        .store
        .insert_sidebar_options(&default_firm_options(&firm.id))
        .api_err("Failed to seed firm sidebar")?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreateFirmResponse { firm, owner })),
    ))
}

pub async fn list_firms(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let firms = state
        .store
        .list_firms(cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list firms")?;

    let (firms, next_cursor, has_more) =
        paginate(firms, DEFAULT_PAGE_SIZE as usize, |firm| firm.id.clone());

    Ok(Json(PaginatedResponse::new(firms, next_cursor, has_more)))
}

pub async fn get_firm(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let firm = state
        .store
        .get_firm(&id)
        .api_err("Failed to get firm")?
        .or_not_found("Firm not found")?;

    Ok(Json(ApiResponse::success(firm)))
}

pub async fn delete_firm(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete_firm(&id)
        .api_err("Failed to delete firm")?;

    if !deleted {
        return Err(ApiError::not_found("Firm not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
