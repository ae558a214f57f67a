use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::{Lane, Stage, SubSidiary, Ticket, User};

/// Returns true if the user may act inside a subsidiary.
/// Firm owners and admins cover every subsidiary of their firm; everyone
/// else needs an explicit permission row with access granted.
pub fn check_sub_sidiary_access(
    store: &dyn Store,
    user: &User,
    sub: &SubSidiary,
) -> Result<bool, ApiError> {
    if user.role.is_firm_level() {
        return Ok(user.firm_id.as_deref() == Some(sub.firm_id.as_str()));
    }

    if user.firm_id.as_deref() != Some(sub.firm_id.as_str()) {
        return Ok(false);
    }

    let permission = store
        .get_permission(&user.email, &sub.id)
        .api_err("Failed to check permission")?;

    Ok(permission.map(|p| p.access).unwrap_or(false))
}

/// Loads a subsidiary and enforces access, returning 403 when blocked.
pub fn require_sub_sidiary_access(
    store: &dyn Store,
    user: &User,
    sub_sidiary_id: &str,
) -> Result<SubSidiary, ApiError> {
    let sub = store
        .get_sub_sidiary(sub_sidiary_id)
        .api_err("Failed to get subsidiary")?
        .or_not_found("Subsidiary not found")?;

    if !check_sub_sidiary_access(store, user, &sub)? {
        return Err(ApiError::forbidden("No access to this subsidiary"));
    }

    Ok(sub)
}

/// Firm-level surface: owners and admins of that firm only.
pub fn require_firm_access(user: &User, firm_id: &str) -> Result<(), ApiError> {
    if user.role.is_firm_level() && user.firm_id.as_deref() == Some(firm_id) {
        return Ok(());
    }
    Err(ApiError::forbidden("Firm access required"))
}

/// Firm membership without the role requirement, for read surfaces every
/// member shares (notifications, team lists).
pub fn require_firm_membership(user: &User, firm_id: &str) -> Result<(), ApiError> {
    if user.firm_id.as_deref() == Some(firm_id) {
        return Ok(());
    }
    Err(ApiError::forbidden("Not a member of this firm"))
}

/// Subsidiaries the user can see: the whole firm for owners/admins,
/// permission-granted ones for subsidiary roles.
pub fn visible_sub_sidiaries(store: &dyn Store, user: &User) -> Result<Vec<SubSidiary>, ApiError> {
    let Some(firm_id) = user.firm_id.as_deref() else {
        return Ok(vec![]);
    };

    if user.role.is_firm_level() {
        return store
            .list_firm_sub_sidiaries(firm_id)
            .api_err("Failed to list subsidiaries");
    }

    let permissions = store
        .list_user_permissions(&user.email)
        .api_err("Failed to list permissions")?;

    Ok(permissions
        .into_iter()
        .filter(|p| p.permission.access && p.sub_sidiary.firm_id == firm_id)
        .map(|p| p.sub_sidiary)
        .collect())
}

/// Walks ticket -> lane -> stage -> subsidiary, enforcing access at the end.
pub fn require_stage_access(
    store: &dyn Store,
    user: &User,
    stage_id: &str,
) -> Result<(Stage, SubSidiary), ApiError> {
    let stage = store
        .get_stage(stage_id)
        .api_err("Failed to get stage")?
        .or_not_found("Stage not found")?;
    let sub = require_sub_sidiary_access(store, user, &stage.sub_sidiary_id)?;
    Ok((stage, sub))
}

pub fn require_lane_access(
    store: &dyn Store,
    user: &User,
    lane_id: &str,
) -> Result<(Lane, SubSidiary), ApiError> {
    let lane = store
        .get_lane(lane_id)
        .api_err("Failed to get lane")?
        .or_not_found("Lane not found")?;
    let (_, sub) = require_stage_access(store, user, &lane.stage_id)?;
    Ok((lane, sub))
}

pub fn require_ticket_access(
    store: &dyn Store,
    user: &User,
    ticket_id: &str,
) -> Result<(Ticket, SubSidiary), ApiError> {
    let ticket = store
        .get_ticket(ticket_id)
        .api_err("Failed to get ticket")?
        .or_not_found("Ticket not found")?;
    let (_, sub) = require_lane_access(store, user, &ticket.lane_id)?;
    Ok((ticket, sub))
}
