//! Composed read models returned by the aggregate endpoints. Every field is
//! fully typed; nothing here is a loosely shaped blob.

use serde::{Deserialize, Serialize};

use super::models::{
    Contact, Firm, Lane, Notification, Permission, SidebarOption, SubSidiary, Tag, Ticket, User,
};

/// Ticket expanded with its tag set, assignee, and customer for the board view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketWithRelations {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Contact>,
}

/// A lane with its tickets in ascending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneDetail {
    #[serde(flatten)]
    pub lane: Lane,
    pub tickets: Vec<TicketWithRelations>,
}

/// A permission grant joined with the subsidiary it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionWithSubSidiary {
    #[serde(flatten)]
    pub permission: Permission,
    pub sub_sidiary: SubSidiary,
}

/// Everything the shell UI needs about the authenticated identity:
/// the user, their firm, the subsidiaries they may see, their grants,
/// and the sidebar entries for each scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUserView {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firm: Option<Firm>,
    pub sub_sidiaries: Vec<SubSidiary>,
    pub permissions: Vec<PermissionWithSubSidiary>,
    pub firm_sidebar: Vec<SidebarOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationWithUser {
    #[serde(flatten)]
    pub notification: Notification,
    pub user: User,
}
