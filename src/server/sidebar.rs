//! Default navigation entries seeded when a firm or subsidiary is created.

use uuid::Uuid;

use crate::types::{SidebarIcon, SidebarOption, SubSidiary};

pub fn default_firm_options(firm_id: &str) -> Vec<SidebarOption> {
    [
        ("Dashboard", SidebarIcon::Category, format!("/firm/{firm_id}")),
        (
            "Launchpad",
            SidebarIcon::ClipboardIcon,
            format!("/firm/{firm_id}/launchpad"),
        ),
        (
            "Billing",
            SidebarIcon::Payment,
            format!("/firm/{firm_id}/billing"),
        ),
        (
            "Settings",
            SidebarIcon::Settings,
            format!("/firm/{firm_id}/settings"),
        ),
        (
            "Subsidiaries",
            SidebarIcon::Person,
            format!("/firm/{firm_id}/all-subsidiaries"),
        ),
        ("Team", SidebarIcon::Shield, format!("/firm/{firm_id}/team")),
    ]
    .into_iter()
    .map(|(name, icon, link)| SidebarOption {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        icon,
        link,
        firm_id: Some(firm_id.to_string()),
        sub_sidiary_id: None,
    })
    .collect()
}

pub fn default_sub_sidiary_options(sub: &SubSidiary) -> Vec<SidebarOption> {
    let id = &sub.id;
    [
        (
            "Launchpad",
            SidebarIcon::ClipboardIcon,
            format!("/subsidiary/{id}/launchpad"),
        ),
        (
            "Settings",
            SidebarIcon::Settings,
            format!("/subsidiary/{id}/settings"),
        ),
        (
            "Campaigns",
            SidebarIcon::Flag,
            format!("/subsidiary/{id}/campaigns"),
        ),
        (
            "Media",
            SidebarIcon::Database,
            format!("/subsidiary/{id}/media"),
        ),
        (
            "Pipelines",
            SidebarIcon::Stages,
            format!("/subsidiary/{id}/pipelines"),
        ),
        (
            "Contacts",
            SidebarIcon::Person,
            format!("/subsidiary/{id}/contacts"),
        ),
        (
            "Dashboard",
            SidebarIcon::Category,
            format!("/subsidiary/{id}"),
        ),
    ]
    .into_iter()
    .map(|(name, icon, link)| SidebarOption {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        icon,
        link,
        firm_id: None,
        sub_sidiary_id: Some(sub.id.clone()),
    })
    .collect()
}
