use serde::Deserialize;

use crate::error::{Error, Result};

/// Envelope of an incoming billing webhook payload.
#[derive(Debug, Deserialize)]
pub struct BillingEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Present on events emitted for a connected account rather than the
    /// platform account. Those are not projected.
    #[serde(default)]
    pub account: Option<String>,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The subscription payload embedded in lifecycle events.
#[derive(Debug, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    /// Unix seconds.
    pub current_period_end: i64,
    pub plan: PlanObject,
}

#[derive(Debug, Deserialize)]
pub struct PlanObject {
    pub id: String,
}

impl BillingEvent {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| Error::BadRequest(format!("invalid webhook payload: {e}")))
    }

    pub fn is_subscription_lifecycle(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            "customer.subscription.created" | "customer.subscription.updated"
        )
    }

    pub fn subscription(&self) -> Result<SubscriptionObject> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| Error::BadRequest(format!("invalid subscription object: {e}")))
    }
}
