// Library interface for testing

pub mod config;
pub mod constants;
pub mod credentials;
pub mod db;
pub mod db_postgres;
pub mod error;
pub mod platform;
pub mod provision;
pub mod queries;
pub mod schema;
pub mod server;
pub mod signature;
pub mod store;
pub mod webhook;

pub use constants::EXPECTED_DB_VERSION;
pub use error::RelayError;
