// SQLite Connection Pool Setup

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Create SQLite connection pool with WAL mode
///
/// Every connection to `:memory:` opens its own database, so in-memory
/// pools are pinned to a single connection.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let max_connections = if in_memory { 1 } else { 10 };
    debug!(database_url, max_connections, "Opening SQLite pool");

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Turn a configured database location into a sqlx SQLite URL
///
/// Accepts full `sqlite:` URLs or bare file paths; a leading `~` in the
/// path is expanded to the home directory.
pub fn resolve_database_url(location: &str) -> String {
    let location = location.trim();
    match location.strip_prefix("sqlite://") {
        Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
        None if location.starts_with("sqlite:") => location.to_string(),
        None => format!("sqlite://{}", shellexpand::tilde(location)),
    }
}

/// File backing a SQLite URL, if any (`None` for in-memory databases)
pub fn database_file(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") {
        return None;
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty()).then(|| PathBuf::from(path))
}
