use sea_query::{ColumnDef, Index, PostgresQueryBuilder, SqliteQueryBuilder, Table};

use crate::schema::{Metadata, StreamStatus};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS stream_status (
///     path TEXT PRIMARY KEY,
///     stream_id TEXT NOT NULL,
///     status TEXT NOT NULL
/// )
pub fn create_stream_status_table() -> String {
    Table::create()
        .table(StreamStatus::Table)
        .if_not_exists()
        .col(ColumnDef::new(StreamStatus::Path).string().primary_key())
        .col(ColumnDef::new(StreamStatus::StreamId).string().not_null())
        .col(ColumnDef::new(StreamStatus::Status).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE UNIQUE INDEX IF NOT EXISTS idx_stream_status_stream_id ON stream_status(stream_id)
///
/// Serves as the stream id -> path index used by webhook lookups.
pub fn create_stream_id_index() -> String {
    Index::create()
        .if_not_exists()
        .unique()
        .name("idx_stream_status_stream_id")
        .table(StreamStatus::Table)
        .col(StreamStatus::StreamId)
        .to_string(SqliteQueryBuilder)
}

// ============================================================================
// PostgreSQL variants
// ============================================================================

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL) - PostgreSQL
pub fn create_metadata_table_pg() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(PostgresQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS stream_status - PostgreSQL
pub fn create_stream_status_table_pg() -> String {
    Table::create()
        .table(StreamStatus::Table)
        .if_not_exists()
        .col(ColumnDef::new(StreamStatus::Path).string().primary_key())
        .col(ColumnDef::new(StreamStatus::StreamId).string().not_null())
        .col(ColumnDef::new(StreamStatus::Status).string().not_null())
        .to_string(PostgresQueryBuilder)
}

/// CREATE UNIQUE INDEX IF NOT EXISTS idx_stream_status_stream_id - PostgreSQL
pub fn create_stream_id_index_pg() -> String {
    Index::create()
        .if_not_exists()
        .unique()
        .name("idx_stream_status_stream_id")
        .table(StreamStatus::Table)
        .col(StreamStatus::StreamId)
        .to_string(PostgresQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_index_is_unique() {
        let sql = create_stream_id_index();
        assert!(sql.contains("UNIQUE INDEX"), "got: {}", sql);
        assert!(sql.contains("\"stream_id\""), "got: {}", sql);
    }

    #[test]
    fn test_stream_status_table_has_path_primary_key() {
        let sql = create_stream_status_table_pg();
        assert!(sql.contains("\"path\""), "got: {}", sql);
        assert!(sql.contains("PRIMARY KEY"), "got: {}", sql);
    }
}
