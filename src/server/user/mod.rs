pub mod access;
mod campaigns;
mod contacts;
mod firms;
mod invitations;
mod lanes;
mod me;
mod media;
mod stages;
mod sub_sidiaries;
mod tags;
mod team;
mod tickets;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(me::get_me))
        // Firm routes
        .route("/firms/{id}", get(firms::get_firm))
        .route("/firms/{id}", patch(firms::update_firm))
        .route("/firms/{id}", delete(firms::delete_firm))
        .route("/firms/{id}/goal", put(firms::update_goal))
        .route("/firms/{id}/notifications", get(firms::list_notifications))
        .route("/firms/{id}/subscription", get(firms::get_subscription))
        .route("/firms/{id}/team", get(firms::list_team))
        // Subsidiary routes
        .route("/sub-sidiaries", post(sub_sidiaries::create_sub_sidiary))
        .route("/sub-sidiaries", get(sub_sidiaries::list_sub_sidiaries))
        .route("/sub-sidiaries/{id}", get(sub_sidiaries::get_sub_sidiary))
        .route(
            "/sub-sidiaries/{id}",
            patch(sub_sidiaries::update_sub_sidiary),
        )
        .route(
            "/sub-sidiaries/{id}",
            delete(sub_sidiaries::delete_sub_sidiary),
        )
        .route("/sub-sidiaries/{id}/team", get(sub_sidiaries::list_team))
        .route(
            "/sub-sidiaries/{id}/permissions",
            put(sub_sidiaries::upsert_permission),
        )
        // Team members
        .route("/users/{id}", patch(team::update_member))
        .route("/users/{id}", delete(team::remove_member))
        // Invitations
        .route("/invitations", post(invitations::create_invitation))
        .route("/invitations/{email}", delete(invitations::revoke_invitation))
        // Pipeline: stages
        .route("/stages", post(stages::create_stage))
        .route("/sub-sidiaries/{id}/stages", get(stages::list_stages))
        .route("/stages/{id}", get(stages::get_board))
        .route("/stages/{id}", patch(stages::update_stage))
        .route("/stages/{id}", delete(stages::delete_stage))
        // Pipeline: lanes
        .route("/lanes", post(lanes::create_lane))
        .route("/lanes/{id}", patch(lanes::update_lane))
        .route("/lanes/{id}", delete(lanes::delete_lane))
        .route("/stages/{id}/lanes/order", put(lanes::reorder_lanes))
        // Pipeline: tickets
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}", patch(tickets::update_ticket))
        .route("/tickets/{id}", delete(tickets::delete_ticket))
        .route("/tickets/order", put(tickets::reorder_tickets))
        // Tags
        .route("/tags", post(tags::create_tag))
        .route("/sub-sidiaries/{id}/tags", get(tags::list_tags))
        .route("/tags/{id}", patch(tags::update_tag))
        .route("/tags/{id}", delete(tags::delete_tag))
        .route("/tickets/{id}/tags", put(tags::set_ticket_tags))
        // Contacts
        .route("/contacts", post(contacts::create_contact))
        .route("/sub-sidiaries/{id}/contacts", get(contacts::list_contacts))
        .route("/contacts/{id}", patch(contacts::update_contact))
        .route("/contacts/{id}", delete(contacts::delete_contact))
        // Media
        .route("/media", post(media::create_media))
        .route("/sub-sidiaries/{id}/media", get(media::list_media))
        .route("/media/{id}", delete(media::delete_media))
        // Campaigns
        .route("/campaigns", post(campaigns::create_campaign))
        .route(
            "/sub-sidiaries/{id}/campaigns",
            get(campaigns::list_campaigns),
        )
        .route("/campaigns/{id}", get(campaigns::get_campaign))
        .route("/campaigns/{id}", patch(campaigns::update_campaign))
        .route("/campaigns/{id}", delete(campaigns::delete_campaign))
        .route(
            "/campaigns/{id}/products",
            put(campaigns::update_campaign_products),
        )
        .route("/campaigns/{id}/pages", post(campaigns::create_page))
        .route("/pages/{id}", patch(campaigns::update_page))
        .route("/pages/{id}", delete(campaigns::delete_page))
}
