use serde::{Deserialize, Serialize};

use crate::pipeline::StageValueSummary;
use crate::types::{Campaign, CampaignPage, Firm, LaneDetail, Role, User};

// Admin surface

#[derive(Debug, Deserialize)]
pub struct CreateFirmRequest {
    pub name: String,
    pub company_email: String,
    #[serde(default)]
    pub company_phone: Option<String>,
    #[serde(default)]
    pub white_label: bool,
    #[serde(default)]
    pub goal: Option<i64>,
    pub owner: FirmOwnerRequest,
}

#[derive(Debug, Deserialize)]
pub struct FirmOwnerRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateFirmResponse {
    pub firm: Firm,
    pub owner: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserTokenRequest {
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInvitationRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcceptInvitationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firm_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

// Firms

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFirmRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_email: Option<String>,
    #[serde(default)]
    pub company_phone: Option<String>,
    #[serde(default)]
    pub white_label: Option<bool>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFirmGoalRequest {
    pub goal: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

// Subsidiaries

#[derive(Debug, Deserialize)]
pub struct CreateSubSidiaryRequest {
    pub firm_id: String,
    pub name: String,
    pub company_email: String,
    #[serde(default)]
    pub company_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubSidiaryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company_email: Option<String>,
    #[serde(default)]
    pub company_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub connect_account_id: Option<String>,
}

// Permissions and invitations

#[derive(Debug, Deserialize)]
pub struct UpsertPermissionRequest {
    pub email: String,
    pub access: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

// Pipeline

#[derive(Debug, Deserialize)]
pub struct CreateStageRequest {
    pub sub_sidiary_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStageRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLaneRequest {
    pub stage_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLaneRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderLanesRequest {
    pub lane_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub lane_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TicketPositionRequest {
    pub ticket_id: String,
    pub lane_id: String,
    pub order: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReorderTicketsRequest {
    pub positions: Vec<TicketPositionRequest>,
}

#[derive(Debug, Serialize)]
pub struct StageBoardResponse {
    pub lanes: Vec<LaneDetail>,
    pub summary: StageValueSummary,
}

// Tags, contacts, media

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub sub_sidiary_id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub sub_sidiary_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactSearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMediaRequest {
    pub sub_sidiary_id: String,
    pub name: String,
    pub link: String,
}

// Campaigns

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub sub_sidiary_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sub_domain_name: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCampaignRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sub_domain_name: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignProductsRequest {
    pub live_products: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignPageRequest {
    pub name: String,
    #[serde(default)]
    pub path_name: String,
    #[serde(default = "default_page_content")]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCampaignPageRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

fn default_page_content() -> String {
    "[]".to_string()
}

// Public content

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub campaign: Campaign,
    pub pages: Vec<CampaignPage>,
    pub page: CampaignPage,
}
