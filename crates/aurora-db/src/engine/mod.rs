//! # Transaction Engine
//!
//! Owns the two state transitions of a sale. Everything else in this crate
//! is plain data access.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       TransactionEngine                                 │
//! │                                                                         │
//! │   checkout(request) ──► BEGIN ─► checkout_in ─► COMMIT ─► sale_id       │
//! │                                       │                                 │
//! │   refund(id, credit) ─► BEGIN ─► refund_in ───► COMMIT ─► Sale          │
//! │                                       │                                 │
//! │   replay_offline(n) ──► per command: BEGIN ─► checkout_in               │
//! │                                      ─► mark_applied ─► COMMIT          │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                         Ledger (one connection, one transaction)        │
//! │    products · product_stocks · product_variants · variant_stocks ·      │
//! │    bundles · bundle_items · customers · sales · sale_items              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - A call either commits all of its writes or none of them.
//! - Stock never goes negative: the plan checks summed demand, every
//!   decrement is guarded, and the schema has `CHECK (quantity >= 0)`.
//! - A sale is refunded at most once.
//! - Every call takes its branch explicitly; the engine holds no session
//!   state and can be shared across concurrent requests.
//! - No internal retries. A transaction that loses a write race surfaces as
//!   [`EngineError::Storage`].

mod checkout;
mod error;
mod ledger;
mod refund;
mod replay;

pub use error::{EngineError, EngineResult};

use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::offline_queue::OfflineQueueRepository;
use aurora_core::{CheckoutRequest, OfflineCheckout, ReplayReport, Sale, ValidationError};

/// Checkout / refund / offline replay over a shared pool.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    pool: SqlitePool,
}

impl TransactionEngine {
    /// Creates a new TransactionEngine.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionEngine { pool }
    }

    /// Records a sale and returns its id.
    ///
    /// ## Errors
    /// - `Rejected(Validation)` - malformed request
    /// - `Rejected(UnknownReference)` - branch, customer, product, variant or bundle missing
    /// - `Rejected(InsufficientStock)` - some non-service stock row is short
    /// - `Rejected(InsufficientStoreCredit)` - Store Credit balance below the total
    /// - `Storage` - anything the database threw
    pub async fn checkout(&self, request: &CheckoutRequest) -> EngineResult<i64> {
        let mut tx = self.pool.begin().await?;

        match checkout::checkout_in(&mut *tx, request).await {
            Ok(sale_id) => {
                tx.commit().await?;
                info!(
                    sale_id,
                    branch_id = %request.branch_id,
                    total = %request.total(),
                    payment_method = ?request.payment_method,
                    lines = request.line_count(),
                    "Checkout committed"
                );
                Ok(sale_id)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                log_failure("Checkout", &err);
                Err(err)
            }
        }
    }

    /// Refunds a completed sale and returns it in its refunded state.
    ///
    /// ## Errors
    /// - `Rejected(AlreadyRefundedOrNotFound)` - no such sale, or already refunded
    /// - `Storage` - anything the database threw
    pub async fn refund(&self, sale_id: i64, refund_to_store_credit: bool) -> EngineResult<Sale> {
        let mut tx = self.pool.begin().await?;

        match refund::refund_in(&mut *tx, sale_id, refund_to_store_credit).await {
            Ok(sale) => {
                tx.commit().await?;
                info!(
                    sale_id,
                    branch_id = %sale.branch_id,
                    total = %sale.total(),
                    refund_to_store_credit,
                    "Refund committed"
                );
                Ok(sale)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                log_failure("Refund", &err);
                Err(err)
            }
        }
    }

    /// Buffers a checkout captured offline. Idempotent on `command_id`,
    /// which must be a UUID generated by the till.
    ///
    /// ## Returns
    /// The stored command and whether this call created it.
    pub async fn enqueue_offline(
        &self,
        command_id: &str,
        request: &CheckoutRequest,
    ) -> EngineResult<(OfflineCheckout, bool)> {
        let command_id = Uuid::parse_str(command_id)
            .map_err(|_| ValidationError::Inconsistent {
                field: "commandId".to_string(),
                reason: "must be a UUID".to_string(),
            })?
            .to_string();

        let queued = OfflineQueueRepository::new(self.pool.clone())
            .enqueue(&command_id, request)
            .await?;
        Ok(queued)
    }

    /// Replays up to `limit` pending offline checkouts through [`checkout`].
    ///
    /// Replay order is arrival order at the server, which need not match the
    /// order the till captured the sales in.
    ///
    /// [`checkout`]: TransactionEngine::checkout
    pub async fn replay_offline(&self, limit: i64) -> DbResult<ReplayReport> {
        replay::replay(&self.pool, limit).await
    }
}

fn log_failure(operation: &str, err: &EngineError) {
    match err {
        EngineError::Rejected(reason) => warn!(%reason, "{operation} rejected"),
        EngineError::Storage(db_err) => error!(error = %db_err, "{operation} failed"),
    }
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{checkout, item, Fixture};
    use crate::{Database, DbConfig};
    use aurora_core::CoreError;
    use std::time::Duration;

    async fn file_fixture(dir: &tempfile::TempDir) -> Fixture {
        let config = DbConfig::new(dir.path().join("aurora.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(5));
        Fixture::with_db(Database::new(config).await.unwrap()).await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let fx = file_fixture(&dir).await;

        // 10 on hand, 8 tills each want 3.
        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = fx.db.engine();
            let request = checkout(vec![item(&fx.p1, 3, 10_000)], vec![], 30_000);
            handles.push(tokio::spawn(async move { engine.checkout(&request).await }));
        }

        let mut committed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(EngineError::Rejected(CoreError::InsufficientStock { .. })) => {}
                Err(EngineError::Storage(err)) => assert!(err.is_transient(), "{err}"),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let remaining = fx.product_stock(fx.p1.id).await.unwrap();
        assert!(remaining >= 0);
        assert!(committed <= 3);
        assert_eq!(remaining, 10 - 3 * committed);
        assert_eq!(fx.row_counts().await.0, committed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refunds_apply_once() {
        let dir = tempfile::tempdir().unwrap();
        let fx = file_fixture(&dir).await;

        let mut request = checkout(vec![item(&fx.p2, 5, 5_000)], vec![], 25_000);
        request.customer_id = Some(fx.customer.id);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = fx.db.engine();
            handles.push(tokio::spawn(async move { engine.refund(sale_id, true).await }));
        }

        let mut refunded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => refunded += 1,
                Err(EngineError::Rejected(CoreError::AlreadyRefundedOrNotFound { .. })) => {}
                Err(EngineError::Storage(err)) => assert!(err.is_transient(), "{err}"),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(refunded, 1);
        assert_eq!(fx.product_stock(fx.p2.id).await, Some(20));
        assert_eq!(fx.store_credit().await, 50_000 + 25_000);
    }
}
