//! Persistence layer modules.

pub mod channel_repo;
pub mod db;
pub mod history_repo;
pub mod retention;
pub mod schema;
pub mod setting_repo;
pub mod task_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
