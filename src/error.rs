use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Terminal failure of a single relay request. Nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Caller input is missing or malformed; no external call was made
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Platform call or initial state write failed during creation
    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    /// Webhook authenticity check failed
    #[error("Webhook signature verification failed: {0}")]
    SignatureInvalid(String),

    /// State update failed after a verified webhook
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) | RelayError::SignatureInvalid(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::ProvisioningFailed(_) | RelayError::PersistenceFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller. Server faults keep their detail in the log only.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::InvalidRequest(_) | RelayError::SignatureInvalid(_) => self.to_string(),
            RelayError::ProvisioningFailed(_) => "Could not create live stream.".to_string(),
            RelayError::PersistenceFailed(_) => "Could not record stream status.".to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
