//! # Catalog Repository
//!
//! Products, variants and bundles. Read-only inputs to the engine; edited
//! here by inventory management.
//!
//! ```text
//! Product ─┬─ ProductVariant (price = product.price + adjustment)
//!          └─ BundleItem ──► Bundle (one priced unit, no stock of its own)
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use aurora_core::validation::validate_quantity;
use aurora_core::{Bundle, BundleItem, Money, Product, ProductVariant};

/// Fields needed to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub unit: String,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, category: impl Into<String>, price_cents: i64) -> Self {
        NewProduct {
            name: name.into(),
            category: category.into(),
            price_cents,
            unit: "pc".to_string(),
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, category, price_cents, unit, is_active, created_at, updated_at";

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Inserts a product and returns it with its generated id.
    pub async fn insert_product(&self, new: &NewProduct) -> DbResult<Product> {
        debug!(name = %new.name, category = %new.category, "Inserting product");

        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO products (name, category, price_cents, unit, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            "#,
        )
        .bind(&new.name)
        .bind(&new.category)
        .bind(new.price_cents)
        .bind(&new.unit)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Product {
            id,
            name: new.name.clone(),
            category: new.category.clone(),
            price_cents: new.price_cents,
            unit: new.unit.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a product by id.
    pub async fn get_product(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products, optionally filtered by category.
    pub async fn list_products(&self, category: Option<&str>) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1 AND (?1 IS NULL OR category = ?1)
            ORDER BY name
            "#
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Changes a product's list price. Past sale items keep their snapshot.
    pub async fn update_price(&self, id: i64, price_cents: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET price_cents = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    // =========================================================================
    // Variants
    // =========================================================================

    /// Inserts a variant of an existing product.
    pub async fn insert_variant(
        &self,
        product_id: i64,
        name: &str,
        price_adjustment_cents: i64,
    ) -> DbResult<ProductVariant> {
        debug!(product_id, name = %name, "Inserting variant");

        let id = sqlx::query(
            r#"
            INSERT INTO product_variants (product_id, name, price_adjustment_cents)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(product_id)
        .bind(name)
        .bind(price_adjustment_cents)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(ProductVariant {
            id,
            product_id,
            name: name.to_string(),
            price_adjustment_cents,
        })
    }

    /// Gets a variant by id.
    pub async fn get_variant(&self, id: i64) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(
            "SELECT id, product_id, name, price_adjustment_cents FROM product_variants WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Lists the variants of a product.
    pub async fn list_variants(&self, product_id: i64) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT id, product_id, name, price_adjustment_cents
            FROM product_variants WHERE product_id = ?1 ORDER BY id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Current unit price of a variant (base price + adjustment).
    pub async fn variant_unit_price(&self, variant_id: i64) -> DbResult<Money> {
        let cents: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT p.price_cents + v.price_adjustment_cents
            FROM product_variants v JOIN products p ON p.id = v.product_id
            WHERE v.id = ?1
            "#,
        )
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;

        cents
            .map(Money::from_cents)
            .ok_or_else(|| DbError::not_found("Variant", variant_id))
    }

    // =========================================================================
    // Bundles
    // =========================================================================

    /// Inserts a bundle and its constituents in one transaction.
    ///
    /// ## Arguments
    /// * `items` - `(product_id, quantity per bundle)` pairs
    pub async fn insert_bundle(
        &self,
        name: &str,
        price_cents: i64,
        items: &[(i64, i64)],
    ) -> DbResult<Bundle> {
        debug!(name = %name, constituents = items.len(), "Inserting bundle");

        let now = Utc::now();
        check_bundle_items(items)?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO bundles (name, price_cents, is_active, created_at) VALUES (?1, ?2, 1, ?3)",
        )
        .bind(name)
        .bind(price_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for &(product_id, quantity) in items {
            sqlx::query(
                "INSERT INTO bundle_items (bundle_id, product_id, quantity) VALUES (?1, ?2, ?3)",
            )
            .bind(id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Bundle {
            id,
            name: name.to_string(),
            price_cents,
            is_active: true,
            created_at: now,
        })
    }

    /// Gets a bundle by id.
    pub async fn get_bundle(&self, id: i64) -> DbResult<Option<Bundle>> {
        let bundle = sqlx::query_as::<_, Bundle>(
            "SELECT id, name, price_cents, is_active, created_at FROM bundles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bundle)
    }

    /// Lists a bundle's current constituents.
    pub async fn bundle_items(&self, bundle_id: i64) -> DbResult<Vec<BundleItem>> {
        let items = sqlx::query_as::<_, BundleItem>(
            r#"
            SELECT bundle_id, product_id, quantity
            FROM bundle_items WHERE bundle_id = ?1 ORDER BY product_id
            "#,
        )
        .bind(bundle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Replaces a bundle's constituents.
    ///
    /// Refunds of earlier bundle sales restock from the new definition.
    pub async fn replace_bundle_items(&self, bundle_id: i64, items: &[(i64, i64)]) -> DbResult<()> {
        check_bundle_items(items)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM bundle_items WHERE bundle_id = ?1")
            .bind(bundle_id)
            .execute(&mut *tx)
            .await?;

        for &(product_id, quantity) in items {
            sqlx::query(
                "INSERT INTO bundle_items (bundle_id, product_id, quantity) VALUES (?1, ?2, ?3)",
            )
            .bind(bundle_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Per-bundle quantities follow the same bounds as a checkout line.
fn check_bundle_items(items: &[(i64, i64)]) -> DbResult<()> {
    for &(product_id, quantity) in items {
        validate_quantity(quantity).map_err(|err| DbError::CheckViolation {
            message: format!("bundle item for product {product_id}: {err}"),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_product_and_variant_pricing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let wash = catalog
            .insert_product(&NewProduct::new("Facial Wash", "Skincare", 25_000).unit("bottle"))
            .await
            .unwrap();
        let large = catalog.insert_variant(wash.id, "200ml", 7_500).await.unwrap();

        let fetched = catalog.get_product(wash.id).await.unwrap().unwrap();
        assert_eq!(fetched.unit, "bottle");
        assert!(fetched.is_active);

        assert_eq!(
            catalog.variant_unit_price(large.id).await.unwrap().cents(),
            32_500
        );
        assert_eq!(catalog.list_variants(wash.id).await.unwrap().len(), 1);

        catalog.update_price(wash.id, 30_000).await.unwrap();
        assert_eq!(
            catalog.variant_unit_price(large.id).await.unwrap().cents(),
            37_500
        );
        assert!(matches!(
            catalog.variant_unit_price(999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_products_by_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        catalog
            .insert_product(&NewProduct::new("Vitamin C", "Supplement", 1_500))
            .await
            .unwrap();
        catalog
            .insert_product(&NewProduct::new("Consultation", "Service", 50_000))
            .await
            .unwrap();

        assert_eq!(catalog.list_products(None).await.unwrap().len(), 2);
        let services = catalog.list_products(Some("Service")).await.unwrap();
        assert_eq!(services.len(), 1);
        assert!(services[0].is_service());
    }

    #[tokio::test]
    async fn test_bundle_with_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let a = catalog
            .insert_product(&NewProduct::new("Toner", "Skincare", 30_000))
            .await
            .unwrap();
        let b = catalog
            .insert_product(&NewProduct::new("Serum", "Skincare", 60_000))
            .await
            .unwrap();

        let kit = catalog
            .insert_bundle("Glow Kit", 80_000, &[(a.id, 2), (b.id, 1)])
            .await
            .unwrap();

        let items = catalog.bundle_items(kit.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_id, a.id);
        assert_eq!(items[0].quantity, 2);

        catalog.replace_bundle_items(kit.id, &[(b.id, 3)]).await.unwrap();
        let items = catalog.bundle_items(kit.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].units_for(2), Ok(6));

        assert_eq!(catalog.get_bundle(kit.id).await.unwrap().unwrap().name, "Glow Kit");
    }

    #[tokio::test]
    async fn test_bundle_item_quantity_bounds() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        let toner = catalog
            .insert_product(&NewProduct::new("Toner", "Skincare", 30_000))
            .await
            .unwrap();

        let err = catalog
            .insert_bundle("Huge", 100, &[(toner.id, i64::MAX / 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        let bundles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bundles")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(bundles, 0);

        let kit = catalog
            .insert_bundle("Glow Kit", 80_000, &[(toner.id, 2)])
            .await
            .unwrap();
        let err = catalog
            .replace_bundle_items(kit.id, &[(toner.id, 1_000)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        // The old definition survives a rejected replacement.
        assert_eq!(catalog.bundle_items(kit.id).await.unwrap()[0].quantity, 2);

        assert!(matches!(
            catalog.insert_bundle("Empty Qty", 100, &[(toner.id, 0)]).await,
            Err(DbError::CheckViolation { .. })
        ));
    }
}
