use serde::{Deserialize, Serialize};

/// Firm-level role of a user. Owners and admins see every subsidiary of
/// their firm; subsidiary users and guests need an explicit permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    FirmOwner,
    FirmAdmin,
    SubsidiaryUser,
    SubsidiaryGuest,
}

impl Role {
    /// Whether this role grants firm-wide access without per-subsidiary grants.
    #[must_use]
    pub fn is_firm_level(self) -> bool {
        matches!(self, Role::FirmOwner | Role::FirmAdmin)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::FirmOwner => "FIRM_OWNER",
            Role::FirmAdmin => "FIRM_ADMIN",
            Role::SubsidiaryUser => "SUBSIDIARY_USER",
            Role::SubsidiaryGuest => "SUBSIDIARY_GUEST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FIRM_OWNER" => Some(Role::FirmOwner),
            "FIRM_ADMIN" => Some(Role::FirmAdmin),
            "SUBSIDIARY_USER" => Some(Role::SubsidiaryUser),
            "SUBSIDIARY_GUEST" => Some(Role::SubsidiaryGuest),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::SubsidiaryUser
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
}

impl InvitationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Revoked => "REVOKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(InvitationStatus::Pending),
            "ACCEPTED" => Some(InvitationStatus::Accepted),
            "REVOKED" => Some(InvitationStatus::Revoked),
            _ => None,
        }
    }
}

/// Closed set of sidebar icon keys the renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SidebarIcon {
    Category,
    ClipboardIcon,
    Payment,
    Settings,
    Person,
    Shield,
    Stages,
    Database,
    Flag,
}

impl SidebarIcon {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SidebarIcon::Category => "category",
            SidebarIcon::ClipboardIcon => "clipboardIcon",
            SidebarIcon::Payment => "payment",
            SidebarIcon::Settings => "settings",
            SidebarIcon::Person => "person",
            SidebarIcon::Shield => "shield",
            SidebarIcon::Stages => "stages",
            SidebarIcon::Database => "database",
            SidebarIcon::Flag => "flag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(SidebarIcon::Category),
            "clipboardIcon" => Some(SidebarIcon::ClipboardIcon),
            "payment" => Some(SidebarIcon::Payment),
            "settings" => Some(SidebarIcon::Settings),
            "person" => Some(SidebarIcon::Person),
            "shield" => Some(SidebarIcon::Shield),
            "stages" => Some(SidebarIcon::Stages),
            "database" => Some(SidebarIcon::Database),
            "flag" => Some(SidebarIcon::Flag),
            _ => None,
        }
    }
}
