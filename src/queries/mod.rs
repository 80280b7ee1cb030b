//! SQL builders (sea-query) for the status store, SQLite and PostgreSQL flavours

pub mod ddl;
pub mod metadata;
pub mod stream_status;
