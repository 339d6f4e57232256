//! # Offline Replay
//!
//! Drains the offline checkout queue through the same checkout path a live
//! till uses. Each command is its own transaction: the sale and the
//! command's `applied` mark commit together or not at all.

use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::checkout::checkout_in;
use super::error::{EngineError, EngineResult};
use crate::error::DbResult;
use crate::repository::offline_queue::{self, OfflineQueueRepository};
use aurora_core::{CheckoutRequest, OfflineCheckout, ReplayOutcome, ReplayReport, ValidationError};

/// Replays up to `limit` pending commands, oldest arrival first.
///
/// Domain rejections are final for a command. Storage failures leave it
/// pending for the next pass. Only failures to read or update the queue
/// itself abort the pass.
pub(crate) async fn replay(pool: &SqlitePool, limit: i64) -> DbResult<ReplayReport> {
    let queue = OfflineQueueRepository::new(pool.clone());
    let pending = queue.pending(limit).await?;
    let mut report = ReplayReport::default();

    info!(pending = pending.len(), "Replaying offline checkouts");

    for entry in pending {
        let command_id = entry.command_id.clone();

        match apply(pool, &entry).await {
            Ok(sale_id) => {
                debug!(command_id = %command_id, sale_id, "Offline checkout applied");
                report.record(ReplayOutcome::applied(command_id, sale_id));
            }
            Err(EngineError::Rejected(reason)) => {
                warn!(command_id = %command_id, %reason, "Offline checkout rejected");
                queue.mark_rejected(&command_id, &reason.to_string()).await?;
                report.record(ReplayOutcome::rejected(command_id, reason.to_string()));
            }
            Err(EngineError::Storage(err)) => {
                error!(command_id = %command_id, error = %err, "Offline checkout deferred");
                queue.mark_attempt_failed(&command_id, &err.to_string()).await?;
                report.record(ReplayOutcome::deferred(command_id, err.to_string()));
            }
        }
    }

    info!(
        applied = report.applied,
        rejected = report.rejected,
        deferred = report.deferred,
        "Offline replay finished"
    );
    Ok(report)
}

async fn apply(pool: &SqlitePool, entry: &OfflineCheckout) -> EngineResult<i64> {
    let request: CheckoutRequest =
        serde_json::from_str(&entry.payload).map_err(|e| ValidationError::Inconsistent {
            field: "payload".to_string(),
            reason: e.to_string(),
        })?;

    let mut tx = pool.begin().await?;
    let applied = async {
        let sale_id = checkout_in(&mut *tx, &request).await?;
        offline_queue::mark_applied(&mut *tx, &entry.command_id, sale_id).await?;
        Ok::<_, EngineError>(sale_id)
    }
    .await;

    match applied {
        Ok(sale_id) => {
            tx.commit().await?;
            Ok(sale_id)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
