mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Desired placement of one ticket in a batch reorder. Cross-lane moves
/// change `lane_id` and `order` together.
#[derive(Debug, Clone)]
pub struct TicketPosition {
    pub ticket_id: String,
    pub lane_id: String,
    pub order: i64,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Firm operations
    fn upsert_firm(&self, firm: &Firm) -> Result<()>;
    fn get_firm(&self, id: &str) -> Result<Option<Firm>>;
    fn get_firm_by_customer_id(&self, customer_id: &str) -> Result<Option<Firm>>;
    fn list_firms(&self, cursor: &str, limit: i32) -> Result<Vec<Firm>>;
    /// Deletes the firm and every subsidiary subtree under it, in one
    /// transaction, children first.
    fn delete_firm(&self, id: &str) -> Result<bool>;

    // SubSidiary operations
    fn upsert_sub_sidiary(&self, sub: &SubSidiary) -> Result<()>;
    fn get_sub_sidiary(&self, id: &str) -> Result<Option<SubSidiary>>;
    fn list_firm_sub_sidiaries(&self, firm_id: &str) -> Result<Vec<SubSidiary>>;
    /// Deletes the subsidiary and everything scoped under it (stages, lanes,
    /// tickets, tags, contacts, media, campaigns, pages, permissions,
    /// sidebar options, notifications) in one transaction, children first.
    fn delete_sub_sidiary(&self, id: &str) -> Result<bool>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;
    fn list_firm_users(&self, firm_id: &str) -> Result<Vec<User>>;
    /// Any user belonging to the firm that owns the given subsidiary.
    /// Used to attribute activity when no authenticated actor is present.
    fn find_user_for_sub_sidiary(&self, sub_sidiary_id: &str) -> Result<Option<User>>;
    /// Subsidiary-role users holding an access=true grant on the subsidiary.
    fn list_sub_sidiary_team_members(&self, sub_sidiary_id: &str) -> Result<Vec<User>>;

    // Permission operations
    fn upsert_permission(&self, permission: &Permission) -> Result<()>;
    fn get_permission(&self, email: &str, sub_sidiary_id: &str) -> Result<Option<Permission>>;
    fn list_user_permissions(&self, email: &str) -> Result<Vec<PermissionWithSubSidiary>>;

    // Invitation operations
    fn create_invitation(&self, invitation: &Invitation) -> Result<()>;
    fn get_pending_invitation(&self, email: &str) -> Result<Option<Invitation>>;
    fn delete_invitation(&self, email: &str) -> Result<bool>;

    // Stage operations
    fn upsert_stage(&self, stage: &Stage) -> Result<()>;
    fn get_stage(&self, id: &str) -> Result<Option<Stage>>;
    fn list_sub_sidiary_stages(&self, sub_sidiary_id: &str) -> Result<Vec<Stage>>;
    fn delete_stage(&self, id: &str) -> Result<bool>;

    // Lane operations
    /// Appends the lane at the end of its stage: order is computed as the
    /// current sibling count inside the INSERT itself.
    fn append_lane(&self, lane: &Lane) -> Result<Lane>;
    fn upsert_lane(&self, lane: &Lane) -> Result<()>;
    fn get_lane(&self, id: &str) -> Result<Option<Lane>>;
    fn list_stage_lanes(&self, stage_id: &str) -> Result<Vec<Lane>>;
    /// Deletes the lane and its tickets. Remaining sibling orders are left
    /// with a gap until the next reorder.
    fn delete_lane(&self, id: &str) -> Result<bool>;
    /// Writes order = index for the supplied complete permutation of the
    /// stage's lanes. All-or-nothing; rejects partial or foreign lists.
    fn reorder_lanes(&self, stage_id: &str, lane_ids: &[String]) -> Result<()>;

    // Ticket operations
    /// Appends the ticket at the end of its lane (order = sibling count).
    fn append_ticket(&self, ticket: &Ticket, tag_ids: &[String]) -> Result<Ticket>;
    fn upsert_ticket(&self, ticket: &Ticket, tag_ids: &[String]) -> Result<()>;
    fn get_ticket(&self, id: &str) -> Result<Option<Ticket>>;
    fn delete_ticket(&self, id: &str) -> Result<bool>;
    /// Applies a batch of ticket placements in one transaction. Every lane
    /// touched by the batch must be completely described: its resulting
    /// ticket set is exactly the positions naming it, densely ordered.
    fn reorder_tickets(&self, positions: &[TicketPosition]) -> Result<()>;
    fn set_ticket_tags(&self, ticket_id: &str, tag_ids: &[String]) -> Result<()>;
    fn list_ticket_tags(&self, ticket_id: &str) -> Result<Vec<Tag>>;

    // Board read model
    /// Lanes of a stage ascending by order, each with tickets ascending by
    /// order, expanded with tags, assignee, and customer.
    fn list_lanes_with_tickets(&self, stage_id: &str) -> Result<Vec<LaneDetail>>;

    // Tag operations
    fn upsert_tag(&self, tag: &Tag) -> Result<()>;
    fn get_tag(&self, id: &str) -> Result<Option<Tag>>;
    fn list_sub_sidiary_tags(&self, sub_sidiary_id: &str) -> Result<Vec<Tag>>;
    fn delete_tag(&self, id: &str) -> Result<bool>;

    // Contact operations
    fn upsert_contact(&self, contact: &Contact) -> Result<()>;
    fn get_contact(&self, id: &str) -> Result<Option<Contact>>;
    fn list_sub_sidiary_contacts(&self, sub_sidiary_id: &str) -> Result<Vec<Contact>>;
    fn search_contacts(&self, sub_sidiary_id: &str, term: &str) -> Result<Vec<Contact>>;
    fn delete_contact(&self, id: &str) -> Result<bool>;

    // Media operations
    fn create_media(&self, media: &Media) -> Result<()>;
    fn get_media(&self, id: &str) -> Result<Option<Media>>;
    fn list_sub_sidiary_media(&self, sub_sidiary_id: &str) -> Result<Vec<Media>>;
    fn delete_media(&self, id: &str) -> Result<bool>;

    // Notification operations (append-only)
    fn create_notification(&self, notification: &Notification) -> Result<()>;
    fn list_firm_notifications(&self, firm_id: &str) -> Result<Vec<NotificationWithUser>>;

    // Subscription operations
    fn upsert_subscription(&self, subscription: &Subscription) -> Result<()>;
    fn get_firm_subscription(&self, firm_id: &str) -> Result<Option<Subscription>>;

    // Campaign operations
    fn upsert_campaign(&self, campaign: &Campaign) -> Result<()>;
    fn get_campaign(&self, id: &str) -> Result<Option<Campaign>>;
    fn get_campaign_by_sub_domain(&self, sub_domain_name: &str) -> Result<Option<Campaign>>;
    fn list_sub_sidiary_campaigns(&self, sub_sidiary_id: &str) -> Result<Vec<Campaign>>;
    fn update_campaign_products(&self, id: &str, live_products: &str) -> Result<()>;
    fn delete_campaign(&self, id: &str) -> Result<bool>;

    // Campaign page operations
    fn append_campaign_page(&self, page: &CampaignPage) -> Result<CampaignPage>;
    fn upsert_campaign_page(&self, page: &CampaignPage) -> Result<()>;
    fn get_campaign_page(&self, id: &str) -> Result<Option<CampaignPage>>;
    fn list_campaign_pages(&self, campaign_id: &str) -> Result<Vec<CampaignPage>>;
    fn delete_campaign_page(&self, id: &str) -> Result<bool>;
    /// Adds exactly 1 to the page's visit counter.
    fn increment_page_visits(&self, id: &str) -> Result<()>;

    // Sidebar options
    fn insert_sidebar_options(&self, options: &[SidebarOption]) -> Result<()>;
    fn list_firm_sidebar_options(&self, firm_id: &str) -> Result<Vec<SidebarOption>>;
    fn list_sub_sidiary_sidebar_options(&self, sub_sidiary_id: &str)
    -> Result<Vec<SidebarOption>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;
    fn has_admin_token(&self) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
