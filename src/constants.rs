/// Expected database schema version
/// Stores created with a different version are refused at startup
pub const EXPECTED_DB_VERSION: &str = "1";

/// Listen port used when neither config, env nor CLI set one
pub const DEFAULT_PORT: u16 = 3000;

/// Seconds the platform keeps a live stream open after the encoder disconnects
pub const RECONNECT_WINDOW_SECS: u32 = 10;

/// Maximum accepted age (either direction) of a webhook signature timestamp
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: u64 = 300;

pub const DEFAULT_MUX_API_BASE: &str = "https://api.mux.com";

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "mux-signature";

/// Well-known slot used in single-tenant mode
pub const SINGLE_TENANT_STATUS_PATH: &str = "live_stream/status";

/// Build the hierarchical status path for a tenant/user pair
pub fn tenant_status_path(app_id: &str, user_id: &str) -> String {
    format!("apps/{}/users/{}/live_stream", app_id, user_id)
}
