use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::access::{require_lane_access, require_ticket_access};
use crate::audit::log_activity;
use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateTicketRequest, ReorderTicketsRequest, UpdateTicketRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_display_name, validate_ticket_value};
use crate::store::TicketPosition;
use crate::types::{SubSidiary, Ticket, TicketWithRelations};

/// Everything a ticket points at must live in the same tenant: tags and the
/// customer contact in the ticket's subsidiary, the assignee in its firm.
fn check_relation_ownership(
    state: &AppState,
    sub: &SubSidiary,
    tag_ids: &[String],
    customer_id: Option<&str>,
    assigned_user_id: Option<&str>,
) -> Result<(), ApiError> {
    for tag_id in tag_ids {
        let tag = state
            .store
            .get_tag(tag_id)
            .api_err("Failed to get tag")?
            .or_not_found("Tag not found")?;
        if tag.sub_sidiary_id != sub.id {
            return Err(ApiError::bad_request(
                "Tag belongs to a different subsidiary",
            ));
        }
    }

    if let Some(contact_id) = customer_id {
        let contact = state
            .store
            .get_contact(contact_id)
            .api_err("Failed to get contact")?
            .or_not_found("Contact not found")?;
        if contact.sub_sidiary_id != sub.id {
            return Err(ApiError::bad_request(
                "Contact belongs to a different subsidiary",
            ));
        }
    }

    if let Some(user_id) = assigned_user_id {
        let assignee = state
            .store
            .get_user(user_id)
            .api_err("Failed to get user")?
            .or_not_found("User not found")?;
        if assignee.firm_id.as_deref() != Some(sub.firm_id.as_str()) {
            return Err(ApiError::bad_request(
                "Assignee belongs to a different firm",
            ));
        }
    }

    Ok(())
}

fn load_with_relations(
    state: &AppState,
    ticket: Ticket,
) -> Result<TicketWithRelations, ApiError> {
    let tags = state
        .store
        .list_ticket_tags(&ticket.id)
        .api_err("Failed to load ticket tags")?;

    let assigned = match ticket.assigned_user_id.as_deref() {
        Some(user_id) => state.store.get_user(user_id).api_err("Failed to load assignee")?,
        None => None,
    };

    let customer = match ticket.customer_id.as_deref() {
        Some(contact_id) => state
            .store
            .get_contact(contact_id)
            .api_err("Failed to load customer")?,
        None => None,
    };

    Ok(TicketWithRelations {
        ticket,
        tags,
        assigned,
        customer,
    })
}

pub async fn create_ticket(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_display_name(&req.name, "Ticket")?;
    if let Some(value) = req.value.as_deref() {
        validate_ticket_value(value)?;
    }

    let (_, sub) = require_lane_access(state.store.as_ref(), &auth.user, &req.lane_id)?;

    check_relation_ownership(
        &state,
        &sub,
        &req.tag_ids,
        req.customer_id.as_deref(),
        req.assigned_user_id.as_deref(),
    )?;

    let now = Utc::now();
    let ticket = Ticket {
        id: Uuid::new_v4().to_string(),
        lane_id: req.lane_id,
        name: req.name,
        description: req.description,
        value: req.value,
        order: 0,
        assigned_user_id: req.assigned_user_id,
        customer_id: req.customer_id,
        created_at: now,
        updated_at: now,
    };

    let ticket = state
        .store
        .append_ticket(&ticket, &req.tag_ids)
        .api_err("Failed to create ticket")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Created a ticket | {}", ticket.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    let detail = load_with_relations(&state, ticket)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

pub async fn get_ticket(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (ticket, _) = require_ticket_access(state.store.as_ref(), &auth.user, &id)?;
    let detail = load_with_relations(&state, ticket)?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn update_ticket(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (mut ticket, sub) = require_ticket_access(state.store.as_ref(), &auth.user, &id)?;

    // Only newly supplied references need checking; what is already on the
    // ticket was checked when it was written.
    check_relation_ownership(
        &state,
        &sub,
        req.tag_ids.as_deref().unwrap_or(&[]),
        req.customer_id.as_deref(),
        req.assigned_user_id.as_deref(),
    )?;

    if let Some(name) = req.name {
        validate_display_name(&name, "Ticket")?;
        ticket.name = name;
    }
    if let Some(value) = req.value {
        validate_ticket_value(&value)?;
        ticket.value = Some(value);
    }
    ticket.description = req.description.or(ticket.description);
    ticket.assigned_user_id = req.assigned_user_id.or(ticket.assigned_user_id);
    ticket.customer_id = req.customer_id.or(ticket.customer_id);
    ticket.updated_at = Utc::now();

    let tag_ids = match req.tag_ids {
        Some(tag_ids) => tag_ids,
        None => state
            .store
            .list_ticket_tags(&ticket.id)
            .api_err("Failed to load ticket tags")?
            .into_iter()
            .map(|tag| tag.id)
            .collect(),
    };

    state
        .store
        .upsert_ticket(&ticket, &tag_ids)
        .api_err("Failed to update ticket")?;

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Updated a ticket | {}", ticket.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    let detail = load_with_relations(&state, ticket)?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn delete_ticket(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (ticket, sub) = require_ticket_access(state.store.as_ref(), &auth.user, &id)?;

    let deleted = state
        .store
        .delete_ticket(&id)
        .api_err("Failed to delete ticket")?;

    if !deleted {
        return Err(ApiError::not_found("Ticket not found"));
    }

    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        &format!("Deleted a ticket | {}", ticket.name),
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Batch reorder, possibly across lanes. Every lane touched must be fully
/// described; the store applies the whole batch or nothing.
pub async fn reorder_tickets(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReorderTicketsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.positions.is_empty() {
        return Err(ApiError::bad_request("No positions supplied"));
    }

    // Access is checked per lane involved, source and destination alike.
    let mut checked_lanes: HashSet<String> = HashSet::new();
    let mut sub = None;
    for position in &req.positions {
        let (ticket, _) =
            require_ticket_access(state.store.as_ref(), &auth.user, &position.ticket_id)?;
        for lane_id in [ticket.lane_id.as_str(), position.lane_id.as_str()] {
            if checked_lanes.insert(lane_id.to_string()) {
                let (_, lane_sub) =
                    require_lane_access(state.store.as_ref(), &auth.user, lane_id)?;
                sub = Some(lane_sub);
            }
        }
    }

    let positions: Vec<TicketPosition> = req
        .positions
        .into_iter()
        .map(|p| TicketPosition {
            ticket_id: p.ticket_id,
            lane_id: p.lane_id,
            order: p.order,
        })
        .collect();

    state.store.reorder_tickets(&positions)?;

    let sub = sub.or_not_found("Lane not found")?;
    log_activity(
        state.store.as_ref(),
        Some(&auth.user),
        "Reordered tickets",
        Some(&sub.firm_id),
        Some(&sub.id),
    );

    Ok(StatusCode::NO_CONTENT)
}
