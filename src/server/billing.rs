use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::billing::{BillingEvent, ProjectionOutcome, project_subscription, verify_signature};
use crate::server::AppState;
use crate::server::response::ApiError;

const SIGNATURE_HEADER: &str = "x-billing-signature";

/// Billing webhook entry point. The body is taken raw because the signature
/// covers the exact bytes sent by the provider.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Err(ApiError::not_found("Billing webhook is not configured"));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing webhook signature"))?;

    verify_signature(secret, signature, &body)
        .map_err(|_| ApiError::unauthorized("Invalid webhook signature"))?;

    let event = BillingEvent::parse(&body)?;
    let outcome = project_subscription(state.store.as_ref(), &event)?;

    let received = match outcome {
        ProjectionOutcome::Applied => {
            tracing::info!("Projected billing event {} ({})", event.id, event.event_type);
            json!({ "received": true, "applied": true })
        }
        ProjectionOutcome::Skipped(reason) => {
            tracing::debug!("Skipped billing event {}: {}", event.id, reason);
            json!({ "received": true, "applied": false })
        }
    };

    Ok((StatusCode::OK, Json(received)))
}
