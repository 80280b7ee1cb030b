use async_trait::async_trait;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::constants::EXPECTED_DB_VERSION;
use crate::queries::{ddl, metadata, stream_status};
use crate::store::{LocatedRecord, StatusRecord, StatusStore, StoreError, StreamStatus};

/// Open a file-based SQLite pool, creating the file if needed
/// Enables WAL mode so webhook writes don't block provisioning reads
pub async fn open_database_connection(
    url: &str,
    max_connections: u32,
) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    info!("SQLite status store: {}", url);
    Ok(pool)
}

/// Initialize database schema
/// Creates tables and the stream id index, then checks the stored version
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(&ddl::create_metadata_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_stream_status_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_stream_id_index())
        .execute(pool)
        .await?;

    sqlx::query(&metadata::insert_or_ignore("version", EXPECTED_DB_VERSION))
        .execute(pool)
        .await?;
    let version: String = sqlx::query_scalar(&metadata::select_by_key("version"))
        .fetch_one(pool)
        .await?;

    if version != EXPECTED_DB_VERSION {
        return Err(StoreError::VersionMismatch {
            found: version,
            expected: EXPECTED_DB_VERSION.to_string(),
        });
    }

    Ok(())
}

/// Create a pool backed by a file in a fresh temporary directory (for testing)
/// The returned guard must be kept alive for as long as the pool is used
pub async fn create_test_connection_in_temporary_file(
) -> Result<(SqlitePool, tempfile::TempDir), StoreError> {
    let dir = tempfile::tempdir().map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?;
    let url = format!("sqlite://{}", dir.path().join("status.sqlite").display());
    let pool = open_database_connection(&url, 5).await?;
    Ok((pool, dir))
}

fn record_from_row(stream_id: String, status: String) -> Result<StatusRecord, StoreError> {
    Ok(StatusRecord {
        stream_id,
        status: status.parse()?,
    })
}

/// Status store backed by SQLite
pub struct SqliteStatusStore {
    pool: SqlitePool,
}

impl SqliteStatusStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn put(&self, path: &str, record: &StatusRecord) -> Result<(), StoreError> {
        let sql = stream_status::upsert(path, &record.stream_id, record.status.as_str());
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<StatusRecord>, StoreError> {
        let sql = stream_status::select_by_path(path);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => Ok(Some(record_from_row(row.try_get(0)?, row.try_get(1)?)?)),
            None => Ok(None),
        }
    }

    async fn find_by_stream_id(
        &self,
        stream_id: &str,
    ) -> Result<Option<LocatedRecord>, StoreError> {
        let sql = stream_status::select_by_stream_id(stream_id);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => Ok(Some(LocatedRecord {
                path: row.try_get(0)?,
                record: record_from_row(row.try_get(1)?, row.try_get(2)?)?,
            })),
            None => Ok(None),
        }
    }

    async fn set_status(
        &self,
        path: &str,
        stream_id: &str,
        status: StreamStatus,
    ) -> Result<bool, StoreError> {
        let sql = stream_status::update_status(path, stream_id, status.as_str());
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (SqliteStatusStore, tempfile::TempDir) {
        let (pool, guard) = create_test_connection_in_temporary_file().await.unwrap();
        init_database_schema(&pool).await.unwrap();
        (SqliteStatusStore::new(pool), guard)
    }

    #[tokio::test]
    async fn test_schema_init_is_idempotent() {
        let (store, _guard) = test_store().await;
        init_database_schema(store.pool()).await.unwrap();
        init_database_schema(store.pool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_version_mismatch_is_refused() {
        let (store, _guard) = test_store().await;
        sqlx::query("UPDATE metadata SET value = '0' WHERE key = 'version'")
            .execute(store.pool())
            .await
            .unwrap();

        let err = init_database_schema(store.pool()).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_put_then_find_by_stream_id() {
        let (store, _guard) = test_store().await;
        let path = "apps/a1/users/u1/live_stream";
        store.put(path, &StatusRecord::idle("s1")).await.unwrap();

        let found = store.find_by_stream_id("s1").await.unwrap().unwrap();
        assert_eq!(found.path, path);
        assert_eq!(found.record, StatusRecord::idle("s1"));
        assert!(store.find_by_stream_id("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_record_at_same_path() {
        let (store, _guard) = test_store().await;
        let path = "live_stream/status";
        store.put(path, &StatusRecord::idle("old")).await.unwrap();
        store.set_status(path, "old", StreamStatus::Active).await.unwrap();
        store.put(path, &StatusRecord::idle("new")).await.unwrap();

        assert_eq!(store.get(path).await.unwrap(), Some(StatusRecord::idle("new")));
        assert!(store.find_by_stream_id("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_status_for_replaced_stream_keeps_new_record() {
        let (store, _guard) = test_store().await;
        let path = "apps/a1/users/u1/live_stream";
        store.put(path, &StatusRecord::idle("old")).await.unwrap();
        let located = store.find_by_stream_id("old").await.unwrap().unwrap();

        // Same tenant provisions again before the event for "old" is applied
        store.put(path, &StatusRecord::idle("new")).await.unwrap();

        let changed = store
            .set_status(&located.path, "old", StreamStatus::Active)
            .await
            .unwrap();
        assert!(!changed);
        assert_eq!(store.get(path).await.unwrap(), Some(StatusRecord::idle("new")));
        assert_eq!(
            store.find_by_stream_id("new").await.unwrap().map(|l| l.path),
            Some(path.to_string())
        );
        assert!(store.find_by_stream_id("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_status_on_missing_path_reports_no_change() {
        let (store, _guard) = test_store().await;
        let changed = store
            .set_status("live_stream/status", "s1", StreamStatus::Active)
            .await
            .unwrap();
        assert!(!changed);
        assert!(store.get("live_stream/status").await.unwrap().is_none());
    }
}
