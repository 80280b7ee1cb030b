//! Video platform control API (Mux) client.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::RECONNECT_WINDOW_SECS;

/// Body of `POST /video/v1/live-streams`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateLiveStreamRequest {
    pub playback_policy: Vec<String>,
    pub new_asset_settings: NewAssetSettings,
    pub reconnect_window: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAssetSettings {
    pub playback_policy: Vec<String>,
}

impl CreateLiveStreamRequest {
    /// Publicly playable stream whose recording is also publicly playable
    pub fn public_with_recording() -> Self {
        Self {
            playback_policy: vec!["public".to_string()],
            new_asset_settings: NewAssetSettings {
                playback_policy: vec!["public".to_string()],
            },
            reconnect_window: RECONNECT_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaybackId {
    pub id: String,
    #[serde(default)]
    pub policy: Option<String>,
}

/// The parts of a created live stream the relay uses
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedLiveStream {
    pub id: String,
    pub stream_key: String,
    pub playback_ids: Vec<PlaybackId>,
}

impl CreatedLiveStream {
    pub fn first_playback_id(&self) -> Option<&str> {
        self.playback_ids.first().map(|p| p.id.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("request to video platform failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("video platform returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response from video platform: {0}")]
    MalformedResponse(String),
}

/// Control-plane operations the relay needs from the video platform
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    async fn create_live_stream(
        &self,
        request: &CreateLiveStreamRequest,
    ) -> Result<CreatedLiveStream, PlatformError>;

    /// Remove a live stream; used to compensate a failed provisioning
    async fn delete_live_stream(&self, stream_id: &str) -> Result<(), PlatformError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct LiveStreamData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    stream_key: Option<String>,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
}

/// HTTP client for the Mux video API, authenticated with an access token pair
pub struct MuxClient {
    client: Client,
    base_url: String,
    token_id: String,
    token_secret: String,
}

impl MuxClient {
    pub fn new(base_url: &str, token_id: &str, token_secret: &str) -> Result<Self, PlatformError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            token_secret: token_secret.to_string(),
        })
    }

    fn live_streams_url(&self) -> String {
        format!("{}/video/v1/live-streams", self.base_url)
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl VideoPlatform for MuxClient {
    async fn create_live_stream(
        &self,
        request: &CreateLiveStreamRequest,
    ) -> Result<CreatedLiveStream, PlatformError> {
        let response = self
            .client
            .post(self.live_streams_url())
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(request)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;

        let envelope: Envelope<LiveStreamData> = response
            .json()
            .await
            .map_err(|e| PlatformError::MalformedResponse(e.to_string()))?;
        let data = envelope.data;

        let id = data
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlatformError::MalformedResponse("missing live stream id".into()))?;
        let stream_key = data
            .stream_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PlatformError::MalformedResponse("missing stream key".into()))?;

        debug!("Created live stream {} with {} playback id(s)", id, data.playback_ids.len());

        Ok(CreatedLiveStream {
            id,
            stream_key,
            playback_ids: data.playback_ids,
        })
    }

    async fn delete_live_stream(&self, stream_id: &str) -> Result<(), PlatformError> {
        let response = self
            .client
            .delete(format!("{}/{}", self.live_streams_url(), stream_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;
        Self::error_for_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_body() {
        let body = serde_json::to_value(CreateLiveStreamRequest::public_with_recording()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "playback_policy": ["public"],
                "new_asset_settings": {"playback_policy": ["public"]},
                "reconnect_window": 10
            })
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = MuxClient::new("http://localhost:9000/", "id", "secret").unwrap();
        assert_eq!(client.live_streams_url(), "http://localhost:9000/video/v1/live-streams");
    }
}
