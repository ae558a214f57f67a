use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::access::{require_firm_access, require_sub_sidiary_access, visible_sub_sidiaries};
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{
    CreateSubSidiaryRequest, UpdateSubSidiaryRequest, UpsertPermissionRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::sidebar::default_sub_sidiary_options;
use crate::server::validation::{validate_display_name, validate_email};
use crate::types::{Permission, SidebarOption, SubSidiary};

#[derive(Debug, Serialize)]
pub struct SubSidiaryDetail {
    #[serde(flatten)]
    pub sub: SubSidiary,
    pub sidebar: Vec<SidebarOption>,
}

pub async fn create_sub_sidiary(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSubSidiaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_firm_access(&auth.user, &req.firm_id)?;
    validate_display_name(&req.name, "Subsidiary")?;
    validate_email(&req.company_email)?;

    let now = Utc::now();
    let sub = SubSidiary {
        id: Uuid::new_v4().to_string(),
        firm_id: req.firm_id,
        name: req.name,
        company_email: req.company_email,
        company_phone: req.company_phone,
        address: req.address,
        city: req.city,
        zip_code: req.zip_code,
        state: req.state,
        country: req.country,
        logo: req.logo,
        connect_account_id: None,
        created_at: now,
        updated_at: now,
    };

    state
        .store
        .upsert_sub_sidiary(&sub)
        .api_err("Failed to create subsidiary")?;

    // Creator gets explicit access even though their firm role already
    // grants it; the row survives a later role downgrade.
    state
        .store
        .upsert_permission(&Permission {
            id: Uuid::new_v4().to_string(),
            email: auth.user.email.clone(),
            sub_sidiary_id: sub.id.clone(),
            access: true,
        })
        .api_err("Failed to grant creator access")?;

    state
        .store
        .insert_sidebar_options(&default_sub_sidiary_options(&sub))
        .api_err("Failed to seed subsidiary sidebar")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Created a subsidiary | {}", sub.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(sub))))
}

pub async fn list_sub_sidiaries(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let subs = visible_sub_sidiaries(state.store.as_ref(), &auth.user)?;
    Ok(Json(ApiResponse::success(subs)))
}

pub async fn get_sub_sidiary(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let sidebar = state
        .store
        .list_sub_sidiary_sidebar_options(&sub.id)
        .api_err("Failed to list sidebar options")?;

    Ok(Json(ApiResponse::success(SubSidiaryDetail { sub, sidebar })))
}

pub async fn update_sub_sidiary(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSubSidiaryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Subsidiary")?;
        sub.name = name;
    }
    if let Some(email) = req.company_email {
        validate_email(&email)?;
        sub.company_email = email;
    }
    sub.company_phone = req.company_phone.or(sub.company_phone);
    sub.address = req.address.or(sub.address);
    sub.city = req.city.or(sub.city);
    sub.zip_code = req.zip_code.or(sub.zip_code);
    sub.state = req.state.or(sub.state);
    sub.country = req.country.or(sub.country);
    sub.logo = req.logo.or(sub.logo);
    sub.connect_account_id = req.connect_account_id.or(sub.connect_account_id);
    sub.updated_at = Utc::now();

    state
        .store
        .upsert_sub_sidiary(&sub)
        .api_err("Failed to update subsidiary")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated subsidiary details | {}", sub.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(Json(ApiResponse::success(sub)))
}

pub async fn delete_sub_sidiary(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;
    require_firm_access(&auth.user, &sub.firm_id)?;

    let deleted = state
        .store
        .delete_sub_sidiary(&id)
        .api_err("Failed to delete subsidiary")?;

    if !deleted {
        return Err(ApiError::not_found("Subsidiary not found"));
    }

    // The subsidiary rows are gone, so the entry hangs off the firm only.
    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Deleted a subsidiary | {}", sub.name),
        Some(&sub.firm_id),
        None,
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_team(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let members = state
        .store
        .list_sub_sidiary_team_members(&id)
        .api_err("Failed to list team members")?;

    Ok(Json(ApiResponse::success(members)))
}

pub async fn upsert_permission(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpsertPermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&req.email)?;

    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;
    require_firm_access(&auth.user, &sub.firm_id)?;

    let permission = Permission {
        id: Uuid::new_v4().to_string(),
        email: req.email.clone(),
        sub_sidiary_id: sub.id.clone(),
        access: req.access,
    };

    state
        .store
        .upsert_permission(&permission)
        .api_err("Failed to update permission")?;

    let verb = if req.access { "Gave" } else { "Revoked" };
    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("{verb} {} access to | {}", req.email, sub.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(Json(ApiResponse::success(permission)))
}
