use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::event::BillingEvent;
use crate::error::Result;
use crate::store::Store;
use crate::types::Subscription;

#[derive(Debug, PartialEq, Eq)]
pub enum ProjectionOutcome {
    Applied,
    Skipped(&'static str),
}

/// Projects a verified billing event into the local subscription row.
///
/// Only active subscription lifecycle events mutate state. Everything else
/// is acknowledged and skipped so the provider does not retry it.
pub fn project_subscription(store: &dyn Store, event: &BillingEvent) -> Result<ProjectionOutcome> {
    if event.account.is_some() {
        return Ok(ProjectionOutcome::Skipped("connected account event"));
    }

    if !event.is_subscription_lifecycle() {
        return Ok(ProjectionOutcome::Skipped("unhandled event type"));
    }

    let object = event.subscription()?;

    if object.status != "active" {
        return Ok(ProjectionOutcome::Skipped("subscription not active"));
    }

    let Some(firm) = store.get_firm_by_customer_id(&object.customer)? else {
        tracing::warn!(
            "No firm found for billing customer {}; skipping event {}",
            object.customer,
            event.id
        );
        return Ok(ProjectionOutcome::Skipped("unknown customer"));
    };

    let period_end = DateTime::<Utc>::from_timestamp(object.current_period_end, 0)
        .unwrap_or_else(Utc::now);

    let now = Utc::now();
    store.upsert_subscription(&Subscription {
        id: Uuid::new_v4().to_string(),
        firm_id: firm.id,
        active: true,
        price_id: object.plan.id.clone(),
        plan: object.plan.id,
        customer_id: object.customer,
        subscription_id: object.id,
        current_period_end: period_end,
        created_at: now,
        updated_at: now,
    })?;

    Ok(ProjectionOutcome::Applied)
}
