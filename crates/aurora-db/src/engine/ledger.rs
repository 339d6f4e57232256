//! # Ledger
//!
//! The engine's data-access interface. Every method runs on the single
//! connection of the caller's open transaction, so nothing written here is
//! visible to anyone else until the engine commits.
//!
//! ## Guarded Writes
//! ```text
//! decrement   UPDATE … SET quantity = quantity - ?q WHERE … AND quantity >= ?q
//! restock     INSERT … ON CONFLICT DO UPDATE SET quantity = quantity + excluded.quantity
//! debit       UPDATE customers … WHERE id = ? AND store_credit_cents >= ?amount
//! refund      UPDATE sales SET status = 'refunded' WHERE id = ? AND status = 'completed'
//! ```
//! A guarded write that matches no row reports `false`; the engine turns
//! that into the matching rejection.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};
use crate::repository::sale::SALE_COLUMNS;
use aurora_core::validation::{bundle_units, ValidationResult};
use aurora_core::{
    is_service_category, Bundle, CheckoutRequest, Product, ProductVariant, Sale, SaleStatus,
    StockTarget,
};

/// A stock ledger row key (the branch is passed separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum StockKey {
    Product(i64),
    Variant(i64),
}

impl StockKey {
    /// Ledger row for a resolved line target. Bundles expand separately.
    pub(crate) fn for_target(target: StockTarget) -> Option<StockKey> {
        match target {
            StockTarget::Product(id) => Some(StockKey::Product(id)),
            StockTarget::Variant(id) => Some(StockKey::Variant(id)),
            StockTarget::Bundle(_) | StockTarget::Untracked => None,
        }
    }

    fn id(self) -> i64 {
        match self {
            StockKey::Product(id) | StockKey::Variant(id) => id,
        }
    }
}

/// One constituent of a bundle, joined with its product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct Constituent {
    pub product_id: i64,
    pub name: String,
    pub category: String,
    /// Units per bundle.
    pub quantity: i64,
}

impl Constituent {
    #[inline]
    pub fn is_service(&self) -> bool {
        is_service_category(&self.category)
    }

    /// Units consumed by `bundles` bundles.
    pub fn units_for(&self, bundles: i64) -> ValidationResult<i64> {
        bundle_units(self.quantity, bundles)
    }
}

/// A sale item as the refund path needs it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RefundLine {
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub bundle_id: Option<i64>,
    pub quantity: i64,
    /// Stored category of `product_id`, if any.
    pub category: Option<String>,
}

impl RefundLine {
    pub fn target(&self) -> StockTarget {
        StockTarget::resolve(
            self.product_id,
            self.variant_id,
            self.bundle_id,
            self.category.as_deref(),
        )
    }
}

/// Fields of a sale item row.
#[derive(Debug, Clone)]
pub(crate) struct NewSaleItem<'a> {
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub bundle_id: Option<i64>,
    pub name: &'a str,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Transaction-scoped access to the stock ledger, sales and store credit.
pub(crate) struct Ledger<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Ledger { conn }
    }

    // =========================================================================
    // Reference data
    // =========================================================================

    pub async fn branch_exists(&mut self, branch_id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM branches WHERE id = ?1")
            .bind(branch_id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(found.is_some())
    }

    pub async fn customer_exists(&mut self, customer_id: i64) -> DbResult<bool> {
        Ok(self.store_credit(customer_id).await?.is_some())
    }

    pub async fn product(&mut self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, price_cents, unit, is_active, created_at, updated_at
            FROM products WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(product)
    }

    pub async fn variant(&mut self, id: i64) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            "SELECT id, product_id, name, price_adjustment_cents FROM product_variants WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(variant)
    }

    pub async fn bundle(&mut self, id: i64) -> DbResult<Option<Bundle>> {
        let bundle = sqlx::query_as::<_, Bundle>(
            "SELECT id, name, price_cents, is_active, created_at FROM bundles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(bundle)
    }

    /// The bundle's constituents as currently defined.
    pub async fn bundle_constituents(&mut self, bundle_id: i64) -> DbResult<Vec<Constituent>> {
        let items = sqlx::query_as::<_, Constituent>(
            r#"
            SELECT bi.product_id, p.name, p.category, bi.quantity
            FROM bundle_items bi JOIN products p ON p.id = bi.product_id
            WHERE bi.bundle_id = ?1
            ORDER BY bi.product_id
            "#,
        )
        .bind(bundle_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(items)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// On-hand quantity; a missing stock row counts as zero.
    pub async fn available(&mut self, key: StockKey, branch_id: &str) -> DbResult<i64> {
        let sql = match key {
            StockKey::Product(_) => {
                "SELECT quantity FROM product_stocks WHERE product_id = ?1 AND branch_id = ?2"
            }
            StockKey::Variant(_) => {
                "SELECT quantity FROM variant_stocks WHERE variant_id = ?1 AND branch_id = ?2"
            }
        };
        let quantity: Option<i64> = sqlx::query_scalar(sql)
            .bind(key.id())
            .bind(branch_id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Removes `quantity` units. Returns `false` (and changes nothing) if
    /// the row is missing or holds fewer units.
    pub async fn decrement(&mut self, key: StockKey, branch_id: &str, quantity: i64) -> DbResult<bool> {
        let sql = match key {
            StockKey::Product(_) => {
                r#"
                UPDATE product_stocks SET quantity = quantity - ?3
                WHERE product_id = ?1 AND branch_id = ?2 AND quantity >= ?3
                "#
            }
            StockKey::Variant(_) => {
                r#"
                UPDATE variant_stocks SET quantity = quantity - ?3
                WHERE variant_id = ?1 AND branch_id = ?2 AND quantity >= ?3
                "#
            }
        };
        let result = sqlx::query(sql)
            .bind(key.id())
            .bind(branch_id)
            .bind(quantity)
            .execute(&mut *self.conn)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Adds `quantity` units, creating the row if needed.
    pub async fn restock(&mut self, key: StockKey, branch_id: &str, quantity: i64) -> DbResult<()> {
        let sql = match key {
            StockKey::Product(_) => {
                r#"
                INSERT INTO product_stocks (product_id, branch_id, quantity) VALUES (?1, ?2, ?3)
                ON CONFLICT(product_id, branch_id)
                DO UPDATE SET quantity = quantity + excluded.quantity
                "#
            }
            StockKey::Variant(_) => {
                r#"
                INSERT INTO variant_stocks (variant_id, branch_id, quantity) VALUES (?1, ?2, ?3)
                ON CONFLICT(variant_id, branch_id)
                DO UPDATE SET quantity = quantity + excluded.quantity
                "#
            }
        };
        sqlx::query(sql)
            .bind(key.id())
            .bind(branch_id)
            .bind(quantity)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Store credit
    // =========================================================================

    /// Current balance; `None` if the customer doesn't exist.
    pub async fn store_credit(&mut self, customer_id: i64) -> DbResult<Option<i64>> {
        let balance = sqlx::query_scalar("SELECT store_credit_cents FROM customers WHERE id = ?1")
            .bind(customer_id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(balance)
    }

    /// Debits the balance. Returns `false` if it would go negative.
    pub async fn debit_store_credit(&mut self, customer_id: i64, cents: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET store_credit_cents = store_credit_cents - ?2, updated_at = ?3
            WHERE id = ?1 AND store_credit_cents >= ?2
            "#,
        )
        .bind(customer_id)
        .bind(cents)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn credit_store_credit(&mut self, customer_id: i64, cents: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET store_credit_cents = store_credit_cents + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(cents)
        .bind(Utc::now())
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id));
        }
        Ok(())
    }

    // =========================================================================
    // Sales
    // =========================================================================

    pub async fn insert_sale(&mut self, request: &CheckoutRequest, at: DateTime<Utc>) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO sales (
                branch_id, customer_id, total_cents, discount_cents,
                payment_method, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&request.branch_id)
        .bind(request.customer_id)
        .bind(request.total_amount_cents)
        .bind(request.discount_amount_cents)
        .bind(request.payment_method)
        .bind(SaleStatus::Completed)
        .bind(at)
        .execute(&mut *self.conn)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn insert_sale_item(&mut self, sale_id: i64, item: NewSaleItem<'_>) -> DbResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, product_id, variant_id, bundle_id,
                name_snapshot, quantity, unit_price_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(sale_id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(item.bundle_id)
        .bind(item.name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .execute(&mut *self.conn)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn sale(&mut self, sale_id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(sale)
    }

    /// `Completed → Refunded`. Returns `false` if the sale was not completed.
    pub async fn mark_refunded(&mut self, sale_id: i64, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET status = ?2, refunded_at = ?3
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(sale_id)
        .bind(SaleStatus::Refunded)
        .bind(at)
        .bind(SaleStatus::Completed)
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn refund_lines(&mut self, sale_id: i64) -> DbResult<Vec<RefundLine>> {
        let lines = sqlx::query_as::<_, RefundLine>(
            r#"
            SELECT si.product_id, si.variant_id, si.bundle_id, si.quantity, p.category
            FROM sale_items si LEFT JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(lines)
    }
}
