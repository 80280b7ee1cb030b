//! Stream provisioning: create the live stream on the platform, then record it as idle.

use axum::{extract::State, Json};
use bytes::Bytes;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::TenancyMode;
use crate::constants::{tenant_status_path, SINGLE_TENANT_STATUS_PATH};
use crate::error::RelayError;
use crate::platform::{CreateLiveStreamRequest, VideoPlatform};
use crate::server::AppState;
use crate::store::{StatusRecord, StatusStore};

/// Request body of `POST /create-live-stream`; empty in single-tenant mode
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiveStreamBody {
    pub user_id: Option<String>,
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiveStreamResponse {
    pub stream_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_id: Option<String>,
}

/// Parse the request body; an empty body means `{}`
pub fn parse_body(body: &[u8]) -> Result<CreateLiveStreamBody, RelayError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(CreateLiveStreamBody::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| RelayError::InvalidRequest(format!("request body is not valid JSON: {}", e)))
}

fn scope_id<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, RelayError> {
    match value.map(str::trim) {
        None | Some("") => Err(RelayError::InvalidRequest(format!("{} is required", name))),
        Some(id) if id.contains('/') => Err(RelayError::InvalidRequest(format!(
            "{} must not contain '/'",
            name
        ))),
        Some(id) => Ok(id),
    }
}

/// Resolve where the status record for this caller lives
pub fn status_path(tenancy: TenancyMode, body: &CreateLiveStreamBody) -> Result<String, RelayError> {
    match tenancy {
        TenancyMode::Single => Ok(SINGLE_TENANT_STATUS_PATH.to_string()),
        TenancyMode::Multi => {
            let user_id = scope_id("userId", body.user_id.as_deref())?;
            let app_id = scope_id("appId", body.app_id.as_deref())?;
            Ok(tenant_status_path(app_id, user_id))
        }
    }
}

/// Create a live stream and write its initial `idle` record.
///
/// The stream key is handed back to the caller and never stored. If the
/// record cannot be written the platform stream is deleted again so no
/// orphan is left behind.
pub async fn create_live_stream(
    platform: &dyn VideoPlatform,
    store: &dyn StatusStore,
    tenancy: TenancyMode,
    body: &CreateLiveStreamBody,
) -> Result<CreateLiveStreamResponse, RelayError> {
    let path = status_path(tenancy, body)?;

    let stream = platform
        .create_live_stream(&CreateLiveStreamRequest::public_with_recording())
        .await
        .map_err(|e| {
            error!("Error creating live stream: {}", e);
            RelayError::ProvisioningFailed(e.to_string())
        })?;

    // Replacing a record leaves its stream on the platform without a status record
    match store.get(&path).await {
        Ok(Some(previous)) if previous.stream_id != stream.id => warn!(
            "Replacing live stream {} at {} with {}; the old stream is no longer tracked",
            previous.stream_id, path, stream.id
        ),
        Ok(_) => {}
        Err(e) => warn!("Could not read existing status record at {}: {}", path, e),
    }

    if let Err(e) = store.put(&path, &StatusRecord::idle(&stream.id)).await {
        error!("Failed to record live stream {} at {}: {}", stream.id, path, e);
        match platform.delete_live_stream(&stream.id).await {
            Ok(()) => info!("Deleted live stream {} after failed status write", stream.id),
            Err(delete_err) => warn!(
                "Live stream {} is orphaned, compensating delete failed: {}",
                stream.id, delete_err
            ),
        }
        return Err(RelayError::ProvisioningFailed(e.to_string()));
    }

    info!("Created live stream {} (status record at {})", stream.id, path);

    Ok(CreateLiveStreamResponse {
        playback_id: stream.first_playback_id().map(str::to_string),
        stream_key: stream.stream_key,
    })
}

/// `POST /create-live-stream`
pub async fn create_live_stream_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreateLiveStreamResponse>, RelayError> {
    let body = parse_body(&body)?;
    let response = create_live_stream(
        state.platform.as_ref(),
        state.store.as_ref(),
        state.tenancy,
        &body,
    )
    .await?;
    Ok(Json(response))
}
