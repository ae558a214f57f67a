//! Activity notifications.
//!
//! Mutating handlers record what happened as a firm-scoped notification.
//! Recording is best effort: a failure here must never fail the request
//! that triggered it, so every error path degrades to a warning log.

use chrono::Utc;
use uuid::Uuid;

use crate::store::Store;
use crate::types::{Notification, User};

/// Records "<actor name> | <description>" against the owning firm.
///
/// When no actor is known (webhook and invitation flows), the first user of
/// the subsidiary's firm is attributed instead. When the firm cannot be
/// resolved at all the entry is dropped with a warning.
pub fn log_activity(
    store: &dyn Store,
    actor: Option<&User>,
    description: &str,
    firm_id: Option<&str>,
    sub_sidiary_id: Option<&str>,
) {
    let resolved_actor = match actor {
        Some(user) => Some(user.clone()),
        None => match sub_sidiary_id {
            Some(sub_id) => match store.find_user_for_sub_sidiary(sub_id) {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!("Failed to resolve fallback actor for activity log: {}", e);
                    None
                }
            },
            None => None,
        },
    };

    let Some(user) = resolved_actor else {
        tracing::warn!("Dropping activity log entry with no resolvable actor: {description}");
        return;
    };

    let resolved_firm = match firm_id {
        Some(id) => Some(id.to_string()),
        None => sub_sidiary_id.and_then(|sub_id| match store.get_sub_sidiary(sub_id) {
            Ok(sub) => sub.map(|s| s.firm_id),
            Err(e) => {
                tracing::warn!("Failed to resolve firm for activity log: {}", e);
                None
            }
        }),
    };

    let Some(firm_id) = resolved_firm else {
        tracing::warn!("Dropping activity log entry with no resolvable firm: {description}");
        return;
    };

    let notification = Notification {
        id: Uuid::new_v4().to_string(),
        notification: format!("{} | {}", user.name, description),
        firm_id,
        sub_sidiary_id: sub_sidiary_id.map(String::from),
        user_id: user.id,
        created_at: Utc::now(),
    };

    if let Err(e) = store.create_notification(&notification) {
        tracing::warn!("Failed to record activity notification: {}", e);
    }
}
