use sea_query::{Expr, OnConflict, PostgresQueryBuilder, Query, SqliteQueryBuilder};

use crate::schema::StreamStatus;

/// INSERT INTO stream_status (path, stream_id, status) VALUES (?, ?, ?)
/// ON CONFLICT (path) DO UPDATE SET stream_id = excluded.stream_id, status = excluded.status
pub fn upsert(path: &str, stream_id: &str, status: &str) -> String {
    Query::insert()
        .into_table(StreamStatus::Table)
        .columns([StreamStatus::Path, StreamStatus::StreamId, StreamStatus::Status])
        .values_panic([path.into(), stream_id.into(), status.into()])
        .on_conflict(
            OnConflict::column(StreamStatus::Path)
                .update_columns([StreamStatus::StreamId, StreamStatus::Status])
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT stream_id, status FROM stream_status WHERE path = ?
pub fn select_by_path(path: &str) -> String {
    Query::select()
        .columns([StreamStatus::StreamId, StreamStatus::Status])
        .from(StreamStatus::Table)
        .and_where(Expr::col(StreamStatus::Path).eq(path))
        .to_string(SqliteQueryBuilder)
}

/// SELECT path, stream_id, status FROM stream_status WHERE stream_id = ?
pub fn select_by_stream_id(stream_id: &str) -> String {
    Query::select()
        .columns([StreamStatus::Path, StreamStatus::StreamId, StreamStatus::Status])
        .from(StreamStatus::Table)
        .and_where(Expr::col(StreamStatus::StreamId).eq(stream_id))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE stream_status SET status = ? WHERE path = ? AND stream_id = ?
pub fn update_status(path: &str, stream_id: &str, status: &str) -> String {
    Query::update()
        .table(StreamStatus::Table)
        .values([(StreamStatus::Status, status.into())])
        .and_where(Expr::col(StreamStatus::Path).eq(path))
        .and_where(Expr::col(StreamStatus::StreamId).eq(stream_id))
        .to_string(SqliteQueryBuilder)
}

// ============================================================================
// PostgreSQL variants
// ============================================================================

/// INSERT INTO stream_status ... ON CONFLICT (path) DO UPDATE - PostgreSQL
pub fn upsert_pg(path: &str, stream_id: &str, status: &str) -> String {
    Query::insert()
        .into_table(StreamStatus::Table)
        .columns([StreamStatus::Path, StreamStatus::StreamId, StreamStatus::Status])
        .values_panic([path.into(), stream_id.into(), status.into()])
        .on_conflict(
            OnConflict::column(StreamStatus::Path)
                .update_columns([StreamStatus::StreamId, StreamStatus::Status])
                .to_owned(),
        )
        .to_string(PostgresQueryBuilder)
}

/// SELECT stream_id, status FROM stream_status WHERE path = ? - PostgreSQL
pub fn select_by_path_pg(path: &str) -> String {
    Query::select()
        .columns([StreamStatus::StreamId, StreamStatus::Status])
        .from(StreamStatus::Table)
        .and_where(Expr::col(StreamStatus::Path).eq(path))
        .to_string(PostgresQueryBuilder)
}

/// SELECT path, stream_id, status FROM stream_status WHERE stream_id = ? - PostgreSQL
pub fn select_by_stream_id_pg(stream_id: &str) -> String {
    Query::select()
        .columns([StreamStatus::Path, StreamStatus::StreamId, StreamStatus::Status])
        .from(StreamStatus::Table)
        .and_where(Expr::col(StreamStatus::StreamId).eq(stream_id))
        .to_string(PostgresQueryBuilder)
}

/// UPDATE stream_status SET status = ? WHERE path = ? AND stream_id = ? - PostgreSQL
pub fn update_status_pg(path: &str, stream_id: &str, status: &str) -> String {
    Query::update()
        .table(StreamStatus::Table)
        .values([(StreamStatus::Status, status.into())])
        .and_where(Expr::col(StreamStatus::Path).eq(path))
        .and_where(Expr::col(StreamStatus::StreamId).eq(stream_id))
        .to_string(PostgresQueryBuilder)
}
