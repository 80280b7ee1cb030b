use serde::Deserialize;
use std::fmt;

/// Database service-account blob, supplied as JSON in `DATABASE_CREDENTIALS`
///
/// Format:
/// ```json
/// { "database_url": "sqlite:///var/lib/live_relay/status.sqlite", "max_connections": 5 }
/// ```
#[derive(Clone, Deserialize)]
pub struct DatabaseCredentials {
    pub database_url: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = self.database_url.split(':').next().unwrap_or_default();
        f.debug_struct("DatabaseCredentials")
            .field("database_url", &format_args!("{}:<redacted>", scheme))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Secrets the relay needs at startup, all read from the environment
#[derive(Clone)]
pub struct Credentials {
    pub mux_token_id: String,
    pub mux_token_secret: String,
    pub webhook_secret: String,
    pub database: DatabaseCredentials,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("mux_token_id", &self.mux_token_id)
            .field("mux_token_secret", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

pub const MUX_TOKEN_ID_VAR: &str = "MUX_TOKEN_ID";
pub const MUX_TOKEN_SECRET_VAR: &str = "MUX_TOKEN_SECRET";
pub const MUX_WEBHOOK_SECRET_VAR: &str = "MUX_WEBHOOK_SECRET";
pub const DATABASE_CREDENTIALS_VAR: &str = "DATABASE_CREDENTIALS";

/// Load credentials from the process environment
pub fn load_credentials() -> Result<Credentials, String> {
    load_credentials_from(|name| std::env::var(name).ok())
}

/// Load credentials through an arbitrary variable lookup
///
/// Every missing variable is reported in one error so a misconfigured
/// deployment can be fixed in a single pass.
pub fn load_credentials_from<F>(lookup: F) -> Result<Credentials, String>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let mux_token_id = get(MUX_TOKEN_ID_VAR);
    let mux_token_secret = get(MUX_TOKEN_SECRET_VAR);
    let webhook_secret = get(MUX_WEBHOOK_SECRET_VAR);
    let database_blob = get(DATABASE_CREDENTIALS_VAR);

    let missing: Vec<&str> = [
        (MUX_TOKEN_ID_VAR, mux_token_id.is_none()),
        (MUX_TOKEN_SECRET_VAR, mux_token_secret.is_none()),
        (MUX_WEBHOOK_SECRET_VAR, webhook_secret.is_none()),
        (DATABASE_CREDENTIALS_VAR, database_blob.is_none()),
    ]
    .into_iter()
    .filter(|(_, is_missing)| *is_missing)
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        ));
    }

    let database = parse_database_credentials(&database_blob.unwrap_or_default())?;

    Ok(Credentials {
        mux_token_id: mux_token_id.unwrap_or_default(),
        mux_token_secret: mux_token_secret.unwrap_or_default(),
        webhook_secret: webhook_secret.unwrap_or_default(),
        database,
    })
}

/// Parse the database credential blob
pub fn parse_database_credentials(blob: &str) -> Result<DatabaseCredentials, String> {
    let credentials: DatabaseCredentials = serde_json::from_str(blob)
        .map_err(|e| format!("Failed to parse {}: {}", DATABASE_CREDENTIALS_VAR, e))?;

    if credentials.database_url.trim().is_empty() {
        return Err(format!("{}: database_url is empty", DATABASE_CREDENTIALS_VAR));
    }
    if credentials.max_connections == Some(0) {
        return Err(format!("{}: max_connections must be at least 1", DATABASE_CREDENTIALS_VAR));
    }

    Ok(credentials)
}
