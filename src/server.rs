use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{RelayConfig, TenancyMode};
use crate::credentials::Credentials;
use crate::platform::{MuxClient, VideoPlatform};
use crate::provision::create_live_stream_handler;
use crate::store::{open_status_store, StatusStore};
use crate::webhook::mux_webhook_handler;

/// Shared, read-only handles built once at startup and handed to every request
pub struct AppState {
    pub platform: Arc<dyn VideoPlatform>,
    pub store: Arc<dyn StatusStore>,
    pub tenancy: TenancyMode,
    pub webhook_secret: String,
    pub signature_tolerance_secs: u64,
}

/// Build the HTTP surface around an already-constructed state
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/create-live-stream", post(create_live_stream_handler))
        .route("/mux-webhook", post(mux_webhook_handler))
        .layer(cors)
        .with_state(state)
}

// Liveness probe
async fn index_handler() -> impl IntoResponse {
    (StatusCode::OK, "Stream+ Backend is running!")
}

// Health check endpoint - returns 200 OK if server is running
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Open the store, build the platform client and run the relay until the process stops
pub fn serve(config: RelayConfig, credentials: Credentials) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = open_status_store(&credentials.database)
            .await
            .map_err(|e| format!("Failed to open status store: {}", e))?;

        let platform = MuxClient::new(
            &config.mux_api_base_url,
            &credentials.mux_token_id,
            &credentials.mux_token_secret,
        )
        .map_err(|e| format!("Failed to build video platform client: {}", e))?;

        let app_state = Arc::new(AppState {
            platform: Arc::new(platform),
            store,
            tenancy: config.tenancy,
            webhook_secret: credentials.webhook_secret.clone(),
            signature_tolerance_secs: config.signature_tolerance_secs,
        });

        let app = build_router(app_state);

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", config.port, e))?;

        info!("Tenancy mode: {:?}", config.tenancy);
        info!("Listening on: http://[::]:{} (IPv4 + IPv6)", config.port);
        info!("Endpoints:");
        info!("  GET  /                    - Liveness probe");
        info!("  GET  /health              - Health check");
        info!("  POST /create-live-stream  - Provision a live stream");
        info!("  POST /mux-webhook         - Platform event callback");

        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
