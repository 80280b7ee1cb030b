use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Stream status table - one row per status document
#[derive(Iden)]
pub enum StreamStatus {
    Table,
    Path,
    StreamId,
    Status,
}
