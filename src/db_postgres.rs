//! PostgreSQL status store
//!
//! Mirrors db.rs but uses PgPool instead of SqlitePool, for deployments where
//! several relay instances share one database.

use async_trait::async_trait;
use log::info;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::constants::EXPECTED_DB_VERSION;
use crate::queries::{ddl, metadata, stream_status};
use crate::store::{LocatedRecord, StatusRecord, StatusStore, StoreError, StreamStatus};

/// Open a PostgreSQL connection pool
pub async fn open_postgres_connection(
    url: &str,
    max_connections: u32,
) -> Result<PgPool, StoreError> {
    let options = PgConnectOptions::from_str(url)?;

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    let parsed = url::Url::parse(url).map_err(|_| StoreError::UnsupportedUrl(url.to_string()))?;
    info!(
        "PostgreSQL status store: {}{}",
        parsed.host_str().unwrap_or("localhost"),
        parsed.path()
    );
    Ok(pool)
}

/// Initialize database schema for PostgreSQL
pub async fn init_database_schema_pg(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(&ddl::create_metadata_table_pg())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_stream_status_table_pg())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_stream_id_index_pg())
        .execute(pool)
        .await?;

    sqlx::query(&metadata::insert_or_ignore_pg("version", EXPECTED_DB_VERSION))
        .execute(pool)
        .await?;
    let version: String = sqlx::query_scalar(&metadata::select_by_key_pg("version"))
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

/// Status store backed by PostgreSQL
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn put(&self, path: &str, record: &StatusRecord) -> Result<(), StoreError> {
        let sql = stream_status::upsert_pg(path, &record.stream_id, record.status.as_str());
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<StatusRecord>, StoreError> {
        let sql = stream_status::select_by_path_pg(path);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => {
                let status: String = row.try_get(1)?;
                Ok(Some(StatusRecord {
                    stream_id: row.try_get(0)?,
                    status: status.parse()?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn find_by_stream_id(
        &self,
        stream_id: &str,
    ) -> Result<Option<LocatedRecord>, StoreError> {
        let sql = stream_status::select_by_stream_id_pg(stream_id);
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => {
                let status: String = row.try_get(2)?;
                Ok(Some(LocatedRecord {
                    path: row.try_get(0)?,
                    record: StatusRecord {
                        stream_id: row.try_get(1)?,
                        status: status.parse()?,
                    },
                }))
            }
            None => Ok(None),
        }
    }

    async fn set_status(
        &self,
        path: &str,
        stream_id: &str,
        status: StreamStatus,
    ) -> Result<bool, StoreError> {
        let sql = stream_status::update_status_pg(path, stream_id, status.as_str());
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
