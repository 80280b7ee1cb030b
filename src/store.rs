//! Status record model and the storage seam shared by the provisioner and the webhook relay.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::credentials::DatabaseCredentials;

/// Broadcast state of a live stream as last reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Idle,
    Active,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "idle",
            StreamStatus::Active => "active",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(StreamStatus::Idle),
            "active" => Ok(StreamStatus::Active),
            other => Err(StoreError::CorruptRecord(format!(
                "unknown status value '{}'",
                other
            ))),
        }
    }
}

/// The persisted document: `{ streamId, status }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub stream_id: String,
    pub status: StreamStatus,
}

impl StatusRecord {
    /// Record written at provisioning time
    pub fn idle(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            status: StreamStatus::Idle,
        }
    }
}

/// A status record together with the path it lives at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedRecord {
    pub path: String,
    pub record: StatusRecord,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt status record: {0}")]
    CorruptRecord(String),

    #[error("unsupported database version '{found}', expected '{expected}'")]
    VersionMismatch { found: String, expected: String },

    #[error("unsupported database url '{0}' (expected sqlite: or postgres:)")]
    UnsupportedUrl(String),
}

/// Document store holding one status record per live stream.
///
/// Writes are single-document and atomic; nothing here spans documents.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Create or replace the record at `path`
    async fn put(&self, path: &str, record: &StatusRecord) -> Result<(), StoreError>;

    /// Record at `path`, if any
    async fn get(&self, path: &str) -> Result<Option<StatusRecord>, StoreError>;

    /// Indexed lookup of the record carrying `stream_id`, across all tenants
    async fn find_by_stream_id(&self, stream_id: &str)
        -> Result<Option<LocatedRecord>, StoreError>;

    /// Overwrite `status` at `path` if the record there still carries `stream_id`.
    /// Returns false when no such record exists, including when the path was
    /// re-provisioned with a different stream in the meantime.
    async fn set_status(
        &self,
        path: &str,
        stream_id: &str,
        status: StreamStatus,
    ) -> Result<bool, StoreError>;
}

/// Open the store named by the credential blob and make sure its schema is current
pub async fn open_status_store(
    credentials: &DatabaseCredentials,
) -> Result<Arc<dyn StatusStore>, StoreError> {
    let url = credentials.database_url.as_str();
    let max_connections = credentials.max_connections.unwrap_or(5);

    if url.starts_with("sqlite:") {
        let pool = crate::db::open_database_connection(url, max_connections).await?;
        crate::db::init_database_schema(&pool).await?;
        Ok(Arc::new(crate::db::SqliteStatusStore::new(pool)))
    } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
        let pool = crate::db_postgres::open_postgres_connection(url, max_connections).await?;
        crate::db_postgres::init_database_schema_pg(&pool).await?;
        Ok(Arc::new(crate::db_postgres::PgStatusStore::new(pool)))
    } else {
        Err(StoreError::UnsupportedUrl(url.to_string()))
    }
}
