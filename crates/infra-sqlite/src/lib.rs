// Sentiq Infrastructure - SQLite Adapter
// Implements: QueueClient (leased queue), queue administration

mod connection;
mod migration;
mod queue_client;

pub use connection::{create_pool, database_file, resolve_database_url};
pub use migration::run_migrations;
pub use queue_client::{dead_letter_queue, QueueDepth, SqliteQueueClient};

// Note: sqlx::Error is mapped to QueueError inside the adapter
// (orphan rules prevent From<sqlx::Error> for core error types here)
