// SQLite QueueClient Implementation

use async_trait::async_trait;
use sentiq_core::domain::Lease;
use sentiq_core::port::{Delivery, IdProvider, QueueClient, QueueError, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEAD_LETTER_SUFFIX: &str = "-dead";

/// Name of the dead-letter queue paired with `queue`
pub fn dead_letter_queue(queue: &str) -> String {
    format!("{}{}", queue, DEAD_LETTER_SUFFIX)
}

/// Dead-letter queues are terminal and never redriven further
fn is_dead_letter_queue(queue: &str) -> bool {
    queue.ends_with(DEAD_LETTER_SUFFIX)
}

// Helper to convert sqlx::Error to QueueError with structured information
fn map_sqlx_error(err: sqlx::Error) -> QueueError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                Some("787") | Some("3850") => QueueError::QueueNotFound(db_err.message().to_string()),
                Some("5") => QueueError::Transport(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                Some("13") => QueueError::Transport(format!("Database full: {}", db_err.message())),
                Some(code) => QueueError::Transport(format!(
                    "Database error [{}]: {}",
                    code,
                    db_err.message()
                )),
                None => QueueError::Transport(format!("Database error: {}", db_err.message())),
            }
        }
        // Connection, pool, protocol errors
        _ => QueueError::Transport(err.to_string()),
    }
}

/// Message counts for one queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDepth {
    /// Receivable now
    pub visible: i64,
    /// Leased and not yet expired
    pub in_flight: i64,
}

impl QueueDepth {
    pub fn total(&self) -> i64 {
        self.visible + self.in_flight
    }
}

#[derive(sqlx::FromRow)]
struct LeasedRow {
    id: String,
    body: String,
    visible_at: i64,
    receive_count: i64,
}

/// Durable queue on SQLite with visibility-timeout leases
///
/// Several processes may share one database file; `receive` claims a
/// message in a single UPDATE so two consumers never hold a valid lease on
/// the same message at once.
pub struct SqliteQueueClient {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    max_receive_count: Option<u32>,
}

impl SqliteQueueClient {
    pub fn new(
        pool: SqlitePool,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            pool,
            time_provider,
            id_provider,
            max_receive_count: None,
        }
    }

    /// Move messages received `max_receive_count` times to the dead-letter
    /// queue instead of redelivering them
    pub fn with_max_receive_count(mut self, max_receive_count: Option<u32>) -> Self {
        self.max_receive_count = max_receive_count.filter(|max| *max > 0);
        self
    }

    /// Get-or-create a named queue
    pub async fn ensure_queue(&self, queue: &str) -> Result<(), QueueError> {
        let now = self.time_provider.now_millis();
        let result = sqlx::query("INSERT OR IGNORE INTO queues (name, created_at) VALUES (?, ?)")
            .bind(queue)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            info!(queue = %queue, "Queue created");
        }
        Ok(())
    }

    /// Names of every known queue
    pub async fn list_queues(&self) -> Result<Vec<String>, QueueError> {
        sqlx::query_scalar("SELECT name FROM queues ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    /// Delete every message in the queue, leased or not
    pub async fn purge(&self, queue: &str) -> Result<u64, QueueError> {
        self.require_queue(queue).await?;
        let result = sqlx::query("DELETE FROM messages WHERE queue = ?")
            .bind(queue)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        info!(queue = %queue, removed = result.rows_affected(), "Queue purged");
        Ok(result.rows_affected())
    }

    pub async fn depth(&self, queue: &str) -> Result<QueueDepth, QueueError> {
        self.require_queue(queue).await?;
        let now = self.time_provider.now_millis();

        let (visible, in_flight): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN visible_at <= ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN visible_at > ? THEN 1 ELSE 0 END), 0)
            FROM messages
            WHERE queue = ?
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(queue)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(QueueDepth { visible, in_flight })
    }

    async fn require_queue(&self, queue: &str) -> Result<(), QueueError> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queues WHERE name = ?")
            .bind(queue)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if exists == 0 {
            return Err(QueueError::QueueNotFound(queue.to_string()));
        }
        Ok(())
    }

    /// Move exhausted, currently visible messages to the dead-letter queue
    async fn redrive_exhausted(&self, queue: &str, max: u32, now: i64) -> Result<(), QueueError> {
        let dead = dead_letter_queue(queue);
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("INSERT OR IGNORE INTO queues (name, created_at) VALUES (?, ?)")
            .bind(&dead)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let moved = sqlx::query(
            r#"
            UPDATE messages
            SET queue = ?, receipt_token = NULL, receive_count = 0, visible_at = ?
            WHERE queue = ? AND visible_at <= ? AND receive_count >= ?
            "#,
        )
        .bind(&dead)
        .bind(now)
        .bind(queue)
        .bind(now)
        .bind(i64::from(max))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        if moved.rows_affected() > 0 {
            warn!(
                queue = %queue,
                dead_letter_queue = %dead,
                moved = moved.rows_affected(),
                "Moved exhausted messages to dead-letter queue"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl QueueClient for SqliteQueueClient {
    async fn receive(
        &self,
        queue: &str,
        lease_duration: Duration,
    ) -> Result<Option<Delivery>, QueueError> {
        self.require_queue(queue).await?;

        let now = self.time_provider.now_millis();
        if let Some(max) = self.max_receive_count {
            if !is_dead_letter_queue(queue) {
                self.redrive_exhausted(queue, max, now).await?;
            }
        }

        let receipt_token = self.id_provider.generate_id();
        let expires_at = Lease::expiry_from(now, lease_duration);

        let row = sqlx::query_as::<_, LeasedRow>(
            r#"
            UPDATE messages
            SET visible_at = ?, receipt_token = ?, receive_count = receive_count + 1
            WHERE id = (
                SELECT id FROM messages
                WHERE queue = ? AND visible_at <= ?
                ORDER BY visible_at ASC, created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING id, body, visible_at, receive_count
            "#,
        )
        .bind(expires_at)
        .bind(&receipt_token)
        .bind(queue)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| {
            debug!(
                queue = %queue,
                message_id = %row.id,
                receive_count = row.receive_count,
                "Message leased"
            );
            Delivery {
                body: row.body,
                lease: Lease::new(row.id, receipt_token, row.visible_at),
                receive_count: u32::try_from(row.receive_count).unwrap_or(u32::MAX),
            }
        }))
    }

    async fn acknowledge(&self, queue: &str, lease: &Lease) -> Result<(), QueueError> {
        let now = self.time_provider.now_millis();
        let result = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE queue = ? AND id = ? AND receipt_token = ? AND visible_at > ?
            "#,
        )
        .bind(queue)
        .bind(&lease.message_id)
        .bind(&lease.receipt_token)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            warn!(
                queue = %queue,
                message_id = %lease.message_id,
                "Acknowledge ignored: lease expired or superseded"
            );
        } else {
            debug!(queue = %queue, message_id = %lease.message_id, "Message acknowledged");
        }
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &str) -> Result<(), QueueError> {
        self.require_queue(queue).await?;

        let now = self.time_provider.now_millis();
        let id = self.id_provider.generate_id();
        sqlx::query(
            r#"
            INSERT INTO messages (id, queue, body, visible_at, receipt_token, receive_count, created_at)
            VALUES (?, ?, ?, ?, NULL, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(queue)
        .bind(payload)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(queue = %queue, message_id = %id, "Message published");
        Ok(())
    }
}
