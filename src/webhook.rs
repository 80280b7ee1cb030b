//! Webhook relay: verify a platform event and mirror lifecycle changes into the status record.

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::SIGNATURE_HEADER;
use crate::error::RelayError;
use crate::server::AppState;
use crate::signature;
use crate::store::{StatusStore, StreamStatus};

/// Event envelope `{ type, data: { id, ... } }`; other fields are ignored
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    /// Whether a status record was updated
    pub applied: bool,
}

/// Map a lifecycle event type to the status it implies, with or without the `video.` prefix
pub fn status_for_event(event_type: &str) -> Option<StreamStatus> {
    match event_type.strip_prefix("video.").unwrap_or(event_type) {
        "live_stream.active" => Some(StreamStatus::Active),
        "live_stream.idle" => Some(StreamStatus::Idle),
        _ => None,
    }
}

/// Apply a verified event. Returns whether a record was changed.
///
/// Unknown stream ids and non-lifecycle events are acknowledged without effect.
pub async fn apply_event(store: &dyn StatusStore, event: &WebhookEvent) -> Result<bool, RelayError> {
    let Some(status) = status_for_event(&event.event_type) else {
        debug!("Ignoring webhook event {}", event.event_type);
        return Ok(false);
    };

    let stream_id = event
        .data
        .as_ref()
        .and_then(|d| d.id.as_deref())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            RelayError::InvalidRequest(format!("{} event is missing data.id", event.event_type))
        })?;

    let located = store.find_by_stream_id(stream_id).await.map_err(|e| {
        error!("Failed to look up status record for {}: {}", stream_id, e);
        RelayError::PersistenceFailed(e.to_string())
    })?;

    let Some(located) = located else {
        warn!("No status record for live stream {}, ignoring {}", stream_id, event.event_type);
        return Ok(false);
    };

    let updated = store
        .set_status(&located.path, stream_id, status)
        .await
        .map_err(|e| {
            error!("Failed to set {} to {}: {}", located.path, status, e);
            RelayError::PersistenceFailed(e.to_string())
        })?;

    if updated {
        info!(
            "Live stream {} is now {} (was {}, {})",
            stream_id, status, located.record.status, located.path
        );
    } else {
        warn!(
            "{} was re-provisioned before {} for {} could be applied",
            located.path, event.event_type, stream_id
        );
    }
    Ok(updated)
}

/// Verify and apply one delivery. `now` is unix seconds.
pub async fn handle_delivery(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> Result<WebhookAck, RelayError> {
    let header = headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| RelayError::SignatureInvalid("mux-signature header is not valid text".into()))?;

    signature::verify(
        body,
        header,
        &state.webhook_secret,
        now,
        state.signature_tolerance_secs,
    )
    .map_err(|e| {
        warn!("Rejected webhook delivery: {}", e);
        RelayError::SignatureInvalid(e.to_string())
    })?;

    let event: WebhookEvent = serde_json::from_slice(body).map_err(|e| {
        warn!("Verified webhook body is not a valid event: {}", e);
        RelayError::InvalidRequest(format!("malformed event payload: {}", e))
    })?;

    let applied = apply_event(state.store.as_ref(), &event).await?;
    Ok(WebhookAck {
        received: true,
        applied,
    })
}

/// `POST /mux-webhook`
pub async fn mux_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, RelayError> {
    let now = chrono::Utc::now().timestamp();
    let ack = handle_delivery(&state, &headers, &body, now).await?;
    Ok(Json(ack))
}
