//! Shared fixture for engine and repository tests.
//!
//! ```text
//! B1 (COMPANY-OWNED)                      B2 (MANAGED)
//! ├── p1            Product      10        └── (no stock rows)
//! ├── p2            Supplement   20
//! ├── consultation  Service      (no row)
//! ├── wash          Product       4
//! │   └── large     variant +₱75  5
//! └── kit = 2×p1 + 1×p2 + 1×consultation
//!
//! customer: store credit ₱500.00
//! ```

use aurora_core::{
    Bundle, CheckoutBundleLine, CheckoutItemLine, CheckoutRequest, Customer, Ownership,
    PaymentMethod, Product, ProductVariant,
};

use crate::repository::{NewCustomer, NewProduct};
use crate::{Database, DbConfig};

pub(crate) const BRANCH: &str = "B1";
pub(crate) const OTHER_BRANCH: &str = "B2";

pub(crate) struct Fixture {
    pub db: Database,
    pub p1: Product,
    pub p2: Product,
    pub consultation: Product,
    pub wash: Product,
    pub large: ProductVariant,
    pub kit: Bundle,
    pub customer: Customer,
}

/// Every stock row and credit balance, for before/after comparisons.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Snapshot {
    product_stocks: Vec<(i64, String, i64)>,
    variant_stocks: Vec<(i64, String, i64)>,
    credits: Vec<(i64, i64)>,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::with_db(db).await
    }

    pub async fn with_db(db: Database) -> Self {
        let branches = db.branches();
        branches
            .insert(BRANCH, "Main", Ownership::CompanyOwned)
            .await
            .unwrap();
        branches
            .insert(OTHER_BRANCH, "Uptown", Ownership::Managed)
            .await
            .unwrap();

        let catalog = db.catalog();
        let p1 = catalog
            .insert_product(&NewProduct::new("Vitamin C 500mg", "Product", 10_000))
            .await
            .unwrap();
        let p2 = catalog
            .insert_product(&NewProduct::new("Fish Oil", "Supplement", 5_000).unit("bottle"))
            .await
            .unwrap();
        let consultation = catalog
            .insert_product(&NewProduct::new("Consultation", "Service", 50_000))
            .await
            .unwrap();
        let wash = catalog
            .insert_product(&NewProduct::new("Facial Wash", "Product", 25_000))
            .await
            .unwrap();
        let large = catalog.insert_variant(wash.id, "Large", 7_500).await.unwrap();
        let kit = catalog
            .insert_bundle(
                "Wellness Kit",
                40_000,
                &[(p1.id, 2), (p2.id, 1), (consultation.id, 1)],
            )
            .await
            .unwrap();

        let stock = db.stock();
        stock.set_product_stock(p1.id, BRANCH, 10).await.unwrap();
        stock.set_product_stock(p2.id, BRANCH, 20).await.unwrap();
        stock.set_product_stock(wash.id, BRANCH, 4).await.unwrap();
        stock.set_variant_stock(large.id, BRANCH, 5).await.unwrap();

        let customer = db
            .customers()
            .insert(&NewCustomer::new("Maria Santos").store_credit(50_000))
            .await
            .unwrap();

        Fixture {
            db,
            p1,
            p2,
            consultation,
            wash,
            large,
            kit,
            customer,
        }
    }

    pub async fn product_stock(&self, product_id: i64) -> Option<i64> {
        self.db.stock().product_stock(product_id, BRANCH).await.unwrap()
    }

    pub async fn variant_stock(&self, variant_id: i64) -> Option<i64> {
        self.db.stock().variant_stock(variant_id, BRANCH).await.unwrap()
    }

    pub async fn store_credit(&self) -> i64 {
        self.db
            .customers()
            .get(self.customer.id)
            .await
            .unwrap()
            .unwrap()
            .store_credit_cents
    }

    pub async fn snapshot(&self) -> Snapshot {
        let pool = self.db.pool();
        let product_stocks = sqlx::query_as(
            "SELECT product_id, branch_id, quantity FROM product_stocks ORDER BY product_id, branch_id",
        )
        .fetch_all(pool)
        .await
        .unwrap();
        let variant_stocks = sqlx::query_as(
            "SELECT variant_id, branch_id, quantity FROM variant_stocks ORDER BY variant_id, branch_id",
        )
        .fetch_all(pool)
        .await
        .unwrap();
        let credits = sqlx::query_as("SELECT id, store_credit_cents FROM customers ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap();

        Snapshot {
            product_stocks,
            variant_stocks,
            credits,
        }
    }

    /// `(sales, sale_items)` row counts.
    pub async fn row_counts(&self) -> (i64, i64) {
        let pool = self.db.pool();
        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(pool)
            .await
            .unwrap();
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(pool)
            .await
            .unwrap();
        (sales, items)
    }
}

pub(crate) fn item(product: &Product, quantity: i64, unit_price_cents: i64) -> CheckoutItemLine {
    CheckoutItemLine {
        product_id: product.id,
        variant_id: None,
        quantity,
        unit_price_cents,
        category: product.category.clone(),
        name: product.name.clone(),
    }
}

pub(crate) fn variant_item(
    product: &Product,
    variant: &ProductVariant,
    quantity: i64,
    unit_price_cents: i64,
) -> CheckoutItemLine {
    CheckoutItemLine {
        variant_id: Some(variant.id),
        name: format!("{} ({})", product.name, variant.name),
        ..item(product, quantity, unit_price_cents)
    }
}

pub(crate) fn bundle_line(bundle: &Bundle, quantity: i64, unit_price_cents: i64) -> CheckoutBundleLine {
    CheckoutBundleLine {
        bundle_id: bundle.id,
        quantity,
        unit_price_cents,
    }
}

/// Cash checkout at [`BRANCH`] with no discount and no customer.
pub(crate) fn checkout(
    items: Vec<CheckoutItemLine>,
    bundles: Vec<CheckoutBundleLine>,
    total_amount_cents: i64,
) -> CheckoutRequest {
    CheckoutRequest {
        branch_id: BRANCH.to_string(),
        items,
        bundles,
        discount_amount_cents: 0,
        payment_method: PaymentMethod::Cash,
        customer_id: None,
        total_amount_cents,
    }
}
