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

use super::access::require_sub_sidiary_access;
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    CreateCampaignPageRequest, CreateCampaignRequest, UpdateCampaignPageRequest,
    UpdateCampaignProductsRequest, UpdateCampaignRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_display_name, validate_page_path, validate_sub_domain};
use crate::types::{Campaign, CampaignPage, SubSidiary};

#[derive(Debug, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub pages: Vec<CampaignPage>,
}

fn campaign_scope(
    state: &AppState,
    auth: &RequireUser,
    campaign_id: &str,
) -> Result<(Campaign, SubSidiary), ApiError> {
    let campaign = state
        .store
        .get_campaign(campaign_id)
        .api_err("Failed to get campaign")?
        .or_not_found("Campaign not found")?;
    let sub =
        require_sub_sidiary_access(state.store.as_ref(), &auth.user, &campaign.sub_sidiary_id)?;
    Ok((campaign, sub))
}

fn save_campaign(state: &AppState, campaign: &Campaign) -> Result<(), ApiError> {
    match state.store.upsert_campaign(campaign) {
        Ok(()) => Ok(()),
        Err(Error::Database(rusqlite::Error::SqliteFailure(err, _)))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ApiError::conflict("Subdomain is already taken"))
        }
        Err(_) => Err(ApiError::internal("Failed to save campaign")),
    }
}

pub async fn create_campaign(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Campaign")?;
    if let Some(domain) = req.sub_domain_name.as_deref() {
        validate_sub_domain(domain)?;
    }

    let sub = require_sub_sidiary_access(state.store.as_ref(), &auth.user, &req.sub_sidiary_id)?;

    let now = Utc::now();
    let campaign = Campaign {
        id: Uuid::new_v4().to_string(),
        sub_sidiary_id: sub.id.clone(),
        name: req.name,
        description: req.description,
        sub_domain_name: req.sub_domain_name,
        favicon: req.favicon,
        published: req.published,
        live_products: "[]".to_string(),
        created_at: now,
        updated_at: now,
    };

    save_campaign(&state, &campaign)?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Created a campaign | {}", campaign.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(campaign))))
}

pub async fn list_campaigns(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_sub_sidiary_access(state.store.as_ref(), &auth.user, &id)?;

    let campaigns = state
        .store
        .list_sub_sidiary_campaigns(&id)
        .api_err("Failed to list campaigns")?;

    Ok(Json(ApiResponse::success(campaigns)))
}

pub async fn get_campaign(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (campaign, _) = campaign_scope(&state, &auth, &id)?;

    let pages = state
        .store
        .list_campaign_pages(&campaign.id)
        .api_err("Failed to list campaign pages")?;

    Ok(Json(ApiResponse::success(CampaignDetail {
        campaign,
        pages,
    })))
}

pub async fn update_campaign(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (mut campaign, sub) = campaign_scope(&state, &auth, &id)?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Campaign")?;
        campaign.name = name;
    }
    if let Some(domain) = req.sub_domain_name {
        validate_sub_domain(&domain)?;
        campaign.sub_domain_name = Some(domain);
    }
    if let Some(published) = req.published {
        campaign.published = published;
    }
    campaign.description = req.description.or(campaign.description);
    campaign.favicon = req.favicon.or(campaign.favicon);
    campaign.updated_at = Utc::now();

    save_campaign(&state, &campaign)?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated a campaign | {}", campaign.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(Json(ApiResponse::success(campaign)))
}

pub async fn update_campaign_products(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCampaignProductsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (campaign, _) = campaign_scope(&state, &auth, &id)?;

    // Stored verbatim, but it has to at least be JSON.
    if serde_json::from_str::<serde_json::Value>(&req.live_products).is_err() {
        return Err(ApiError::bad_request("live_products must be valid JSON"));
    }

    state
        .store
        .update_campaign_products(&campaign.id, &req.live_products)
        .api_err("Failed to update campaign products")?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn delete_campaign(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (campaign, sub) = campaign_scope(&state, &auth, &id)?;

    state
        .store
        .delete_campaign(&campaign.id)
        .api_err("Failed to delete campaign")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Deleted a campaign | {}", campaign.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Appends a page to a campaign. The first page becomes the root page and
/// may leave its path empty; later pages need one.
pub async fn create_page(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateCampaignPageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Page")?;

    let (campaign, _) = campaign_scope(&state, &auth, &id)?;

    let existing = state
        .store
        .list_campaign_pages(&campaign.id)
        .api_err("Failed to list campaign pages")?;

    validate_page_path(&req.path_name, existing.is_empty())?;
    if existing.iter().any(|p| p.path_name == req.path_name) {
        return Err(ApiError::conflict("A page with this path already exists"));
    }

    let now = Utc::now();
    let page = CampaignPage {
        id: Uuid::new_v4().to_string(),
        campaign_id: campaign.id.clone(),
        name: req.name,
        path_name: req.path_name,
        order: 0,
        visits: 0,
        content: req.content,
        created_at: now,
        updated_at: now,
    };

    let page = state
        .store
        .append_campaign_page(&page)
        .api_err("Failed to create page")?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(page))))
}

pub async fn update_page(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCampaignPageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut page = state
        .store
        .get_campaign_page(&id)
        .api_err("Failed to get page")?
        .or_not_found("Page not found")?;

    let (campaign, _) = campaign_scope(&state, &auth, &page.campaign_id)?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Page")?;
        page.name = name;
    }
    if let Some(path_name) = req.path_name {
        // The empty-path page is what the bare subdomain resolves to, and
        // there is only ever one. Moving it would leave the site rootless.
        if page.path_name.is_empty() && !path_name.is_empty() {
            return Err(ApiError::bad_request(
                "The root page cannot be moved to a path",
            ));
        }
        validate_page_path(&path_name, page.path_name.is_empty())?;
        let siblings = state
            .store
            .list_campaign_pages(&campaign.id)
            .api_err("Failed to list campaign pages")?;
        if siblings
            .iter()
            .any(|p| p.id != page.id && p.path_name == path_name)
        {
            return Err(ApiError::conflict("A page with this path already exists"));
        }
        page.path_name = path_name;
    }
    if let Some(content) = req.content {
        page.content = content;
    }
    page.updated_at = Utc::now();

    state
        .store
        .upsert_campaign_page(&page)
        .api_err("Failed to update page")?;

    Ok(Json(ApiResponse::success(page)))
}

pub async fn delete_page(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .store
        .get_campaign_page(&id)
        .api_err("Failed to get page")?
        .or_not_found("Page not found")?;

    campaign_scope(&state, &auth, &page.campaign_id)?;

    state
        .store
        .delete_campaign_page(&id)
        .api_err("Failed to delete page")?;

    Ok(StatusCode::NO_CONTENT)
}
