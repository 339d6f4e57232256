//! # Sale Repository
//!
//! Read side of the sales ledger: lookups for receipts and the branch
//! sales report. Sales are only ever written by the transaction engine.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  engine.checkout()  ──► Sale { status: completed } + N SaleItems        │
//! │                                                                         │
//! │  engine.refund()    ──► Sale { status: refunded, refunded_at }          │
//! │                         (items untouched, stock restored)               │
//! │                                                                         │
//! │  THIS MODULE        ──► get / items / list_for_branch / summary         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use aurora_core::{Sale, SaleItem, SalesSummary};

pub(crate) const SALE_COLUMNS: &str = "id, branch_id, customer_id, total_cents, discount_cents, \
                                       payment_method, status, created_at, refunded_at";

pub(crate) const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, variant_id, bundle_id, \
                                            name_snapshot, quantity, unit_price_cents";

/// A sale together with its line items (receipt view).
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items of a sale, in insertion order.
    pub async fn items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale with its items.
    pub async fn get_with_items(&self, id: i64) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.items(id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists a branch's most recent sales, newest first.
    pub async fn list_for_branch(&self, branch_id: &str, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE branch_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#
        ))
        .bind(branch_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Aggregates a branch's sales created in `[from, to)`.
    ///
    /// Discounts are counted for completed sales only.
    pub async fn summary(
        &self,
        branch_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0)
                    AS completed_count,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN total_cents ELSE 0 END), 0)
                    AS completed_total_cents,
                COALESCE(SUM(CASE WHEN status = 'refunded' THEN 1 ELSE 0 END), 0)
                    AS refunded_count,
                COALESCE(SUM(CASE WHEN status = 'refunded' THEN total_cents ELSE 0 END), 0)
                    AS refunded_total_cents,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN discount_cents ELSE 0 END), 0)
                    AS discount_total_cents
            FROM sales
            WHERE branch_id = ?1 AND created_at >= ?2 AND created_at < ?3
            "#,
        )
        .bind(branch_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::test_support::{checkout, item, Fixture, BRANCH, OTHER_BRANCH};
    use aurora_core::SaleStatus;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_get_with_items() {
        let fx = Fixture::new().await;
        let request = checkout(
            vec![item(&fx.p1, 2, 10_000), item(&fx.p2, 1, 5_000)],
            vec![],
            25_000,
        );
        let sale_id = fx.db.engine().checkout(&request).await.unwrap();

        let receipt = fx.db.sales().get_with_items(sale_id).await.unwrap().unwrap();
        assert_eq!(receipt.sale.id, sale_id);
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items[0].name_snapshot, fx.p1.name);
        assert_eq!(receipt.items[1].line_total().cents(), 5_000);

        assert!(fx.db.sales().get_with_items(9_999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_branch_newest_first() {
        let fx = Fixture::new().await;
        let engine = fx.db.engine();
        let first = engine
            .checkout(&checkout(vec![item(&fx.p1, 1, 10_000)], vec![], 10_000))
            .await
            .unwrap();
        let second = engine
            .checkout(&checkout(vec![item(&fx.p2, 1, 5_000)], vec![], 5_000))
            .await
            .unwrap();

        let sales = fx.db.sales().list_for_branch(BRANCH, 10).await.unwrap();
        let ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second, first]);

        assert_eq!(fx.db.sales().list_for_branch(BRANCH, 1).await.unwrap().len(), 1);
        assert!(fx
            .db
            .sales()
            .list_for_branch(OTHER_BRANCH, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_summary_splits_completed_and_refunded() {
        let fx = Fixture::new().await;
        let engine = fx.db.engine();

        let mut discounted = checkout(vec![item(&fx.p1, 2, 10_000)], vec![], 18_000);
        discounted.discount_amount_cents = 2_000;
        engine.checkout(&discounted).await.unwrap();

        let refunded = engine
            .checkout(&checkout(vec![item(&fx.p2, 3, 5_000)], vec![], 15_000))
            .await
            .unwrap();
        engine.refund(refunded, false).await.unwrap();

        let now = Utc::now();
        let summary = fx
            .db
            .sales()
            .summary(BRANCH, now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.completed_total_cents, 18_000);
        assert_eq!(summary.refunded_count, 1);
        assert_eq!(summary.refunded_total_cents, 15_000);
        assert_eq!(summary.discount_total_cents, 2_000);

        let stored = fx.db.sales().get(refunded).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Refunded);
    }

    #[tokio::test]
    async fn test_summary_empty_range() {
        let fx = Fixture::new().await;
        fx.db
            .engine()
            .checkout(&checkout(vec![item(&fx.p1, 1, 10_000)], vec![], 10_000))
            .await
            .unwrap();

        let later = Utc::now() + Duration::days(1);
        let summary = fx
            .db
            .sales()
            .summary(BRANCH, later, later + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(summary.completed_count, 0);
        assert_eq!(summary.completed_total_cents, 0);
    }
}
