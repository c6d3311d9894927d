// Jobsweep Infrastructure - SQLite Adapter
// Implements: KeyValueStore (one instance per storage area)

mod connection;
mod kv_store;
mod migration;

pub use connection::create_pool;
pub use kv_store::{SqliteKeyValueStore, AREA_LOCAL, AREA_SYNC};
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
