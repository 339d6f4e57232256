//! # Offline Checkout Queue Repository
//!
//! Storage for checkouts a till captured while it was disconnected.
//!
//! ## Command Log
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Till (offline)                                                         │
//! │     │  checkout captured with command_id = uuid v4                      │
//! │     ▼                                                                   │
//! │  POST /api/offline-queue ──► enqueue()  (same id twice = no-op)          │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │                        offline_checkouts: pending                       │
//! │                                  │                                      │
//! │  POST /api/offline-queue/replay ─┤                                      │
//! │                                  ├── checkout ok  ─► applied (+sale_id) │
//! │                                  ├── rejected     ─► rejected (+reason) │
//! │                                  └── storage err  ─► pending, attempts+1│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pending commands are replayed oldest-arrival first. Arrival order at the
//! server is not the order the till captured them in.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use aurora_core::{CheckoutRequest, OfflineCheckout, QueueStatus};

const QUEUE_COLUMNS: &str = "command_id, branch_id, payload, status, attempts, last_error, \
                             sale_id, created_at, attempted_at, processed_at";

/// Repository for the offline checkout queue.
#[derive(Debug, Clone)]
pub struct OfflineQueueRepository {
    pool: SqlitePool,
}

impl OfflineQueueRepository {
    /// Creates a new OfflineQueueRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfflineQueueRepository { pool }
    }

    /// Stores a buffered checkout.
    ///
    /// ## Returns
    /// The stored command and whether this call inserted it. A command id
    /// that is already queued returns the existing row untouched.
    pub async fn enqueue(
        &self,
        command_id: &str,
        request: &CheckoutRequest,
    ) -> DbResult<(OfflineCheckout, bool)> {
        let payload = serde_json::to_string(request)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO offline_checkouts (command_id, branch_id, payload, status, attempts, created_at)
            VALUES (?1, ?2, ?3, 'pending', 0, ?4)
            ON CONFLICT(command_id) DO NOTHING
            "#,
        )
        .bind(command_id)
        .bind(&request.branch_id)
        .bind(&payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        debug!(command_id = %command_id, inserted, "Enqueued offline checkout");

        let entry = self
            .get(command_id)
            .await?
            .ok_or_else(|| DbError::not_found("OfflineCheckout", command_id))?;

        Ok((entry, inserted))
    }

    /// Gets a queued command by id.
    pub async fn get(&self, command_id: &str) -> DbResult<Option<OfflineCheckout>> {
        let entry = sqlx::query_as::<_, OfflineCheckout>(&format!(
            "SELECT {QUEUE_COLUMNS} FROM offline_checkouts WHERE command_id = ?1"
        ))
        .bind(command_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Gets pending commands, oldest arrival first.
    pub async fn pending(&self, limit: i64) -> DbResult<Vec<OfflineCheckout>> {
        let entries = sqlx::query_as::<_, OfflineCheckout>(&format!(
            r#"
            SELECT {QUEUE_COLUMNS} FROM offline_checkouts
            WHERE status = 'pending'
            ORDER BY created_at ASC, command_id ASC
            LIMIT ?1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Marks a command as permanently rejected.
    pub async fn mark_rejected(&self, command_id: &str, reason: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE offline_checkouts SET
                status = ?2,
                attempts = attempts + 1,
                last_error = ?3,
                attempted_at = ?4,
                processed_at = ?4
            WHERE command_id = ?1 AND status = 'pending'
            "#,
        )
        .bind(command_id)
        .bind(QueueStatus::Rejected)
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a failed attempt; the command stays pending.
    pub async fn mark_attempt_failed(&self, command_id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE offline_checkouts SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE command_id = ?1 AND status = 'pending'
            "#,
        )
        .bind(command_id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts pending commands.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM offline_checkouts WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

/// Marks a command applied inside the transaction that recorded its sale.
///
/// ## Errors
/// `DbError::Conflict` if the command is no longer pending (a concurrent
/// replay got there first); the caller's transaction must roll back.
pub(crate) async fn mark_applied(
    conn: &mut SqliteConnection,
    command_id: &str,
    sale_id: i64,
) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE offline_checkouts SET
            status = ?2,
            attempts = attempts + 1,
            sale_id = ?3,
            last_error = NULL,
            attempted_at = ?4,
            processed_at = ?4
        WHERE command_id = ?1 AND status = 'pending'
        "#,
    )
    .bind(command_id)
    .bind(QueueStatus::Applied)
    .bind(sale_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::Conflict(format!("offline checkout {command_id}")));
    }
    Ok(())
}
