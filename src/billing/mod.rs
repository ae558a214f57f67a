//! Billing webhook ingestion.
//!
//! An external billing provider pushes subscription lifecycle events over a
//! signed webhook. This crate does not call the provider back; it only
//! projects the events it trusts into the local `subscriptions` table.

mod event;
mod projector;
mod signature;

pub use event::{BillingEvent, SubscriptionObject};
pub use projector::{ProjectionOutcome, project_subscription};
pub use signature::{SIGNATURE_TOLERANCE_SECS, verify_signature};
