//! Public, unauthenticated campaign content.
//!
//! Published campaigns are served by subdomain. Resolving a page bumps its
//! visit counter; campaigns that are unpublished stay invisible here even
//! when the subdomain matches.

use std::sync::Arc;

use axum::{
    Json,
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};

use super::AppState;
use super::dto::SiteResponse;
use super::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{Campaign, CampaignPage};

pub fn content_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{domain}", get(get_site_root))
        .route("/{domain}/{path}", get(get_site_page))
}

fn resolve_campaign(state: &AppState, domain: &str) -> Result<Campaign, ApiError> {
    let campaign = state
        .store
        .get_campaign_by_sub_domain(domain)
        .api_err("Failed to resolve site")?
        .or_not_found("Site not found")?;

    if !campaign.published {
        return Err(ApiError::not_found("Site not found"));
    }

    Ok(campaign)
}

fn serve_page(
    state: &AppState,
    campaign: Campaign,
    path: &str,
) -> Result<Json<ApiResponse<SiteResponse>>, ApiError> {
    let pages = state
        .store
        .list_campaign_pages(&campaign.id)
        .api_err("Failed to load site pages")?;

    let page = pages
        .iter()
        .find(|p| p.path_name == path)
        .cloned()
        .or_not_found("Page not found")?;

    state
        .store
        .increment_page_visits(&page.id)
        .api_err("Failed to record visit")?;

    let page = CampaignPage {
        visits: page.visits + 1,
        ..page
    };

    Ok(Json(ApiResponse::success(SiteResponse {
        campaign,
        pages,
        page,
    })))
}

/// The empty path is the campaign's root page.
pub async fn get_site_root(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let campaign = resolve_campaign(&state, &domain)?;
    serve_page(&state, campaign, "")
}

pub async fn get_site_page(
    State(state): State<Arc<AppState>>,
    Path((domain, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let campaign = resolve_campaign(&state, &domain)?;
    serve_page(&state, campaign, &path)
}
