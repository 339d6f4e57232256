//! # Stock Repository
//!
//! Admin-side view of the per-branch stock ledger: absolute edits (stock
//! counts, deliveries) and reads for inventory screens.
//!
//! Sales and refunds never go through here. They apply deltas inside the
//! engine's transaction (see `engine::ledger`).

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A product's quantity at a branch, with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockLevel {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
}

/// A variant's quantity at a branch, with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VariantStockLevel {
    pub variant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub variant_name: String,
    pub quantity: i64,
}

/// Everything a branch has on hand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStock {
    pub branch_id: String,
    pub products: Vec<ProductStockLevel>,
    pub variants: Vec<VariantStockLevel>,
}

/// Repository for stock ledger reads and admin edits.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Sets the absolute quantity of a product at a branch.
    ///
    /// Creates the stock row if the branch never stocked the product.
    pub async fn set_product_stock(
        &self,
        product_id: i64,
        branch_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        ensure_non_negative(quantity)?;
        debug!(product_id, branch_id = %branch_id, quantity, "Setting product stock");

        sqlx::query(
            r#"
            INSERT INTO product_stocks (product_id, branch_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(product_id, branch_id) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets the absolute quantity of a variant at a branch.
    pub async fn set_variant_stock(
        &self,
        variant_id: i64,
        branch_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        ensure_non_negative(quantity)?;
        debug!(variant_id, branch_id = %branch_id, quantity, "Setting variant stock");

        sqlx::query(
            r#"
            INSERT INTO variant_stocks (variant_id, branch_id, quantity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(variant_id, branch_id) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(variant_id)
        .bind(branch_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Quantity of a product at a branch; `None` if there is no stock row.
    pub async fn product_stock(&self, product_id: i64, branch_id: &str) -> DbResult<Option<i64>> {
        let quantity = sqlx::query_scalar(
            "SELECT quantity FROM product_stocks WHERE product_id = ?1 AND branch_id = ?2",
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity)
    }

    /// Quantity of a variant at a branch; `None` if there is no stock row.
    pub async fn variant_stock(&self, variant_id: i64, branch_id: &str) -> DbResult<Option<i64>> {
        let quantity = sqlx::query_scalar(
            "SELECT quantity FROM variant_stocks WHERE variant_id = ?1 AND branch_id = ?2",
        )
        .bind(variant_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity)
    }

    /// Lists every stocked product and variant at a branch.
    pub async fn list_for_branch(&self, branch_id: &str) -> DbResult<BranchStock> {
        let products = sqlx::query_as::<_, ProductStockLevel>(
            r#"
            SELECT s.product_id, p.name AS product_name, p.category, s.quantity
            FROM product_stocks s JOIN products p ON p.id = s.product_id
            WHERE s.branch_id = ?1
            ORDER BY p.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        let variants = sqlx::query_as::<_, VariantStockLevel>(
            r#"
            SELECT s.variant_id, v.product_id, p.name AS product_name,
                   v.name AS variant_name, s.quantity
            FROM variant_stocks s
            JOIN product_variants v ON v.id = s.variant_id
            JOIN products p ON p.id = v.product_id
            WHERE s.branch_id = ?1
            ORDER BY p.name, v.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BranchStock {
            branch_id: branch_id.to_string(),
            products,
            variants,
        })
    }
}

fn ensure_non_negative(quantity: i64) -> DbResult<()> {
    if quantity < 0 {
        return Err(DbError::CheckViolation {
            message: format!("stock quantity must not be negative (got {quantity})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::repository::NewProduct;
    use crate::{Database, DbConfig, DbError};
    use aurora_core::Ownership;

    #[tokio::test]
    async fn test_set_and_read_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.branches()
            .insert("BR-1", "Main", Ownership::CompanyOwned)
            .await
            .unwrap();
        let product = db
            .catalog()
            .insert_product(&NewProduct::new("Sunscreen", "Skincare", 45_000))
            .await
            .unwrap();
        let variant = db
            .catalog()
            .insert_variant(product.id, "SPF 50", 5_000)
            .await
            .unwrap();

        let stock = db.stock();
        assert_eq!(stock.product_stock(product.id, "BR-1").await.unwrap(), None);

        stock.set_product_stock(product.id, "BR-1", 12).await.unwrap();
        stock.set_product_stock(product.id, "BR-1", 8).await.unwrap();
        stock.set_variant_stock(variant.id, "BR-1", 3).await.unwrap();

        assert_eq!(stock.product_stock(product.id, "BR-1").await.unwrap(), Some(8));
        assert_eq!(stock.variant_stock(variant.id, "BR-1").await.unwrap(), Some(3));

        let listing = stock.list_for_branch("BR-1").await.unwrap();
        assert_eq!(listing.products.len(), 1);
        assert_eq!(listing.products[0].product_name, "Sunscreen");
        assert_eq!(listing.variants[0].variant_name, "SPF 50");
        assert_eq!(listing.variants[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_negative_stock_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.stock().set_product_stock(1, "BR-1", -1).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_branch_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .catalog()
            .insert_product(&NewProduct::new("Toner", "Skincare", 30_000))
            .await
            .unwrap();

        let err = db
            .stock()
            .set_product_stock(product.id, "BR-GHOST", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
