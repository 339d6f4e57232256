//! # Refund
//!
//! Reverses one completed sale atomically: status transition, stock
//! restoration and optional store credit, all in one transaction.
//!
//! ```text
//! sale ──load──► CompletedSale::try_from ──✗──► AlreadyRefundedOrNotFound
//!                      │
//!                      ▼
//!        UPDATE … status = 'refunded' WHERE status = 'completed'
//!                      │
//!                      ▼
//!        per sale item:  variant → +variant stock
//!                        product → +product stock   (services skipped)
//!                        bundle  → +each non-service constituent
//!                      │
//!                      ▼
//!        refund_to_store_credit && customer → +store credit (sale total)
//! ```
//!
//! Bundle constituents come from the bundle's definition at refund time.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::error::EngineResult;
use super::ledger::{Ledger, StockKey};
use aurora_core::{CompletedSale, CoreError, Sale, StockTarget};

/// Runs a refund on an open transaction and returns the refunded sale.
pub(crate) async fn refund_in(
    conn: &mut SqliteConnection,
    sale_id: i64,
    refund_to_store_credit: bool,
) -> EngineResult<Sale> {
    let mut ledger = Ledger::new(conn);

    let sale = ledger
        .sale(sale_id)
        .await?
        .ok_or(CoreError::AlreadyRefundedOrNotFound { sale_id })?;
    let completed = CompletedSale::try_from(sale)?;

    let now = Utc::now();
    if !ledger.mark_refunded(sale_id, now).await? {
        // Lost to a concurrent refund between the read and the update.
        return Err(CoreError::AlreadyRefundedOrNotFound { sale_id }.into());
    }

    let branch_id = completed.sale().branch_id.clone();

    for line in ledger.refund_lines(sale_id).await? {
        match line.target() {
            StockTarget::Variant(variant_id) => {
                ledger
                    .restock(StockKey::Variant(variant_id), &branch_id, line.quantity)
                    .await?;
            }
            StockTarget::Product(product_id) => {
                ledger
                    .restock(StockKey::Product(product_id), &branch_id, line.quantity)
                    .await?;
            }
            StockTarget::Bundle(bundle_id) => {
                for constituent in ledger.bundle_constituents(bundle_id).await? {
                    if constituent.is_service() {
                        continue;
                    }
                    ledger
                        .restock(
                            StockKey::Product(constituent.product_id),
                            &branch_id,
                            constituent.units_for(line.quantity)?,
                        )
                        .await?;
                }
            }
            StockTarget::Untracked => {}
        }
    }

    if refund_to_store_credit {
        if let Some(customer_id) = completed.sale().customer_id {
            let total = completed.sale().total_cents;
            ledger.credit_store_credit(customer_id, total).await?;
            debug!(sale_id, customer_id, total, "Store credit refunded");
        }
    }

    Ok(completed.into_refunded(now))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::engine::EngineError;
    use crate::test_support::{bundle_line, checkout, item, variant_item, Fixture};
    use aurora_core::{CoreError, PaymentMethod, SaleStatus, ValidationError};

    #[tokio::test]
    async fn test_refund_restores_stock_and_credit() {
        let fx = Fixture::new().await;
        let mut request = checkout(vec![item(&fx.p1, 3, 10_000)], vec![], 30_000);
        request.customer_id = Some(fx.customer.id);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(7));

        let refunded = fx.db.engine().refund(sale_id, true).await.unwrap();

        assert_eq!(refunded.status, SaleStatus::Refunded);
        assert!(refunded.refunded_at.is_some());
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(10));
        assert_eq!(fx.store_credit().await, 50_000 + 30_000);

        let stored = fx.db.sales().get(sale_id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Refunded);
        assert!(stored.refunded_at.is_some());
    }

    #[tokio::test]
    async fn test_refund_without_credit_flag_leaves_balance() {
        let fx = Fixture::new().await;
        let mut request = checkout(vec![item(&fx.p1, 1, 10_000)], vec![], 10_000);
        request.customer_id = Some(fx.customer.id);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();

        fx.db.engine().refund(sale_id, false).await.unwrap();
        assert_eq!(fx.store_credit().await, 50_000);
    }

    #[tokio::test]
    async fn test_credit_flag_without_customer_is_noop() {
        let fx = Fixture::new().await;
        let request = checkout(vec![item(&fx.p1, 1, 10_000)], vec![], 10_000);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();

        fx.db.engine().refund(sale_id, true).await.unwrap();
        assert_eq!(fx.store_credit().await, 50_000);
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(10));
    }

    #[tokio::test]
    async fn test_second_refund_rejected_without_side_effects() {
        let fx = Fixture::new().await;
        let mut request = checkout(vec![item(&fx.p1, 2, 10_000)], vec![], 20_000);
        request.customer_id = Some(fx.customer.id);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();
        fx.db.engine().refund(sale_id, true).await.unwrap();

        let before = fx.snapshot().await;
        let err = fx.db.engine().refund(sale_id, true).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::AlreadyRefundedOrNotFound { sale_id: id }) if id == sale_id
        ));
        assert_eq!(fx.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_refund_of_missing_sale() {
        let fx = Fixture::new().await;
        let err = fx.db.engine().refund(4_242, false).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::AlreadyRefundedOrNotFound { sale_id: 4_242 })
        ));
    }

    #[tokio::test]
    async fn test_checkout_refund_conserves_stock() {
        let fx = Fixture::new().await;
        let before = fx.snapshot().await;

        let mut request = checkout(
            vec![
                item(&fx.p1, 1, 10_000),
                item(&fx.p2, 4, 5_000),
                variant_item(&fx.wash, &fx.large, 2, 32_500),
                item(&fx.consultation, 1, 50_000),
            ],
            vec![bundle_line(&fx.kit, 3, 40_000)],
            0,
        );
        request.payment_method = PaymentMethod::Card;
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();
        assert_ne!(fx.snapshot().await, before);

        fx.db.engine().refund(sale_id, false).await.unwrap();
        assert_eq!(fx.snapshot().await, before);
        // Services never gained a stock row.
        assert_eq!(fx.product_stock(fx.consultation.id).await, None);
    }

    #[tokio::test]
    async fn test_refund_uses_current_bundle_definition() {
        let fx = Fixture::new().await;
        let request = checkout(vec![], vec![bundle_line(&fx.kit, 1, 40_000)], 40_000);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(8));
        assert_eq!(fx.product_stock(fx.p2.id).await, Some(19));

        // Kit redefined after the sale: now 1×p2 only.
        fx.db
            .catalog()
            .replace_bundle_items(fx.kit.id, &[(fx.p2.id, 1)])
            .await
            .unwrap();

        fx.db.engine().refund(sale_id, false).await.unwrap();
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(8));
        assert_eq!(fx.product_stock(fx.p2.id).await, Some(20));
    }

    #[tokio::test]
    async fn test_refund_rejects_bundle_unit_overflow() {
        let fx = Fixture::new().await;
        let request = checkout(vec![], vec![bundle_line(&fx.kit, 3, 40_000)], 120_000);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(4));

        sqlx::query("UPDATE bundle_items SET quantity = ?1 WHERE bundle_id = ?2 AND product_id = ?3")
            .bind(i64::MAX / 2)
            .bind(fx.kit.id)
            .bind(fx.p1.id)
            .execute(fx.db.pool())
            .await
            .unwrap();

        let err = fx.db.engine().refund(sale_id, false).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // Rolled back: still completed, nothing restocked.
        let stored = fx.db.sales().get(sale_id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Completed);
        assert_eq!(fx.product_stock(fx.p1.id).await, Some(4));
        assert_eq!(fx.product_stock(fx.p2.id).await, Some(17));
    }

    #[tokio::test]
    async fn test_store_credit_sale_refunded_to_credit() {
        let fx = Fixture::new().await;
        let mut request = checkout(vec![item(&fx.p2, 2, 5_000)], vec![], 10_000);
        request.payment_method = PaymentMethod::StoreCredit;
        request.customer_id = Some(fx.customer.id);
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();
        assert_eq!(fx.store_credit().await, 40_000);

        fx.db.engine().refund(sale_id, true).await.unwrap();
        assert_eq!(fx.store_credit().await, 50_000);
        assert_eq!(fx.product_stock(fx.p2.id).await, Some(20));
    }
}
