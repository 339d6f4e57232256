//! # Domain Types
//!
//! Records persisted by aurora-db and exchanged with the cashier UI.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference data (CRUD, read-only to the engine)                        │
//! │  ┌──────────┐  ┌──────────┐  ┌────────────────┐  ┌──────────────────┐  │
//! │  │  Branch  │  │ Product  │  │ ProductVariant │  │ Bundle/BundleItem│  │
//! │  └──────────┘  └──────────┘  └────────────────┘  └──────────────────┘  │
//! │                                                                         │
//! │  Ledger (written by the transaction engine)                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────┐  ┌──────────┐          │
//! │  │ ProductStock │  │ VariantStock │  │  Sale  │  │ SaleItem │          │
//! │  └──────────────┘  └──────────────┘  └────────┘  └──────────┘          │
//! │                                                                         │
//! │  Customer.store_credit_cents ← written by the engine and by CRUD       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{bundle_units, ValidationResult};
use crate::SERVICE_CATEGORY;

// =============================================================================
// Branch
// =============================================================================

/// Who runs a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Ownership {
    #[serde(rename = "COMPANY-OWNED")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "COMPANY-OWNED"))]
    CompanyOwned,
    #[serde(rename = "MANAGED")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "MANAGED"))]
    Managed,
}

/// A physical or managed location with its own stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Branch {
    /// String key, e.g. "BR-MAKATI".
    pub id: String,
    pub name: String,
    pub ownership: Ownership,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A sellable product or service.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Open set of strings. `"Service"` never consumes stock.
    pub category: String,
    /// Current list price in centavos.
    pub price_cents: i64,
    /// Unit label shown on receipts ("pc", "box", "session").
    pub unit: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Services (consultations, treatments) have no stock ledger.
    #[inline]
    pub fn is_service(&self) -> bool {
        is_service_category(&self.category)
    }
}

/// Returns true for the category that never consumes stock.
#[inline]
pub fn is_service_category(category: &str) -> bool {
    category == SERVICE_CATEGORY
}

/// A priced sub-option of a product (size, strength) with its own stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    /// Added to the base product price. May be negative.
    pub price_adjustment_cents: i64,
}

impl ProductVariant {
    /// Unit price of this variant given its parent product.
    pub fn unit_price(&self, product: &Product) -> Money {
        product.price() + Money::from_cents(self.price_adjustment_cents)
    }
}

/// A fixed-composition group of products sold as one priced unit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Bundle {
    pub id: i64,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One constituent of a bundle.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BundleItem {
    pub bundle_id: i64,
    pub product_id: i64,
    /// Units of the product per bundle.
    pub quantity: i64,
}

impl BundleItem {
    /// Units of the constituent product consumed by `bundles` bundles.
    #[inline]
    pub fn units_for(&self, bundles: i64) -> ValidationResult<i64> {
        bundle_units(self.quantity, bundles)
    }
}

// =============================================================================
// Stock
// =============================================================================

/// On-hand quantity of a product at a branch. Never negative.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductStock {
    pub product_id: i64,
    pub branch_id: String,
    pub quantity: i64,
}

/// On-hand quantity of a variant at a branch. Never negative.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct VariantStock {
    pub variant_id: i64,
    pub branch_id: String,
    pub quantity: i64,
}

/// Which stock ledger row (if any) a sold or refunded line affects.
///
/// ```text
/// category == "Service"  → Untracked   (checked first, always wins)
/// variant_id present     → Variant
/// product_id present     → Product
/// bundle_id present      → Bundle      (expanded into constituents)
/// otherwise              → Untracked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTarget {
    Product(i64),
    Variant(i64),
    Bundle(i64),
    Untracked,
}

impl StockTarget {
    /// Resolves the ledger target of a line.
    ///
    /// `category` is the stored category of the line's product; bundle lines
    /// pass `None`.
    pub fn resolve(
        product_id: Option<i64>,
        variant_id: Option<i64>,
        bundle_id: Option<i64>,
        category: Option<&str>,
    ) -> Self {
        if category.is_some_and(is_service_category) {
            return StockTarget::Untracked;
        }
        match (variant_id, product_id, bundle_id) {
            (Some(variant_id), _, _) => StockTarget::Variant(variant_id),
            (None, Some(product_id), _) => StockTarget::Product(product_id),
            (None, None, Some(bundle_id)) => StockTarget::Bundle(bundle_id),
            (None, None, None) => StockTarget::Untracked,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer/patient record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Prepaid balance in centavos. Never negative.
    pub store_credit_cents: i64,
    pub medical_notes: Option<String>,
    pub allergies: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn store_credit(&self) -> Money {
        Money::from_cents(self.store_credit_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "GCash")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "GCash"))]
    GCash,
    Card,
    #[serde(rename = "QRPH")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "QRPH"))]
    Qrph,
    /// Debits the customer's prepaid balance inside the checkout transaction.
    #[serde(rename = "Store Credit")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Store Credit"))]
    StoreCredit,
}

impl PaymentMethod {
    #[inline]
    pub fn is_store_credit(&self) -> bool {
        matches!(self, PaymentMethod::StoreCredit)
    }
}

// =============================================================================
// Sale Status (state machine)
// =============================================================================

/// Lifecycle of a sale.
///
/// ```text
///   checkout ──► Completed ──refund──► Refunded (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SaleStatus {
    Completed,
    Refunded,
}

impl SaleStatus {
    /// The only legal transition is `Completed → Refunded`.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        matches!((self, next), (SaleStatus::Completed, SaleStatus::Refunded))
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub branch_id: String,
    pub customer_id: Option<i64>,
    /// Caller-supplied amount charged, in centavos.
    pub total_cents: i64,
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale known to be in the `Completed` state.
///
/// The refund path only accepts this handle, so a refunded sale cannot be
/// refunded again by construction.
#[derive(Debug, Clone)]
pub struct CompletedSale(Sale);

impl CompletedSale {
    /// Borrows the underlying sale.
    #[inline]
    pub fn sale(&self) -> &Sale {
        &self.0
    }

    /// Consumes the handle and returns the sale in its `Refunded` state.
    pub fn into_refunded(self, at: DateTime<Utc>) -> Sale {
        let mut sale = self.0;
        sale.status = SaleStatus::Refunded;
        sale.refunded_at = Some(at);
        sale
    }
}

impl TryFrom<Sale> for CompletedSale {
    type Error = CoreError;

    fn try_from(sale: Sale) -> CoreResult<Self> {
        if sale.status.can_transition_to(SaleStatus::Refunded) {
            Ok(CompletedSale(sale))
        } else {
            Err(CoreError::AlreadyRefundedOrNotFound { sale_id: sale.id })
        }
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Uses the snapshot pattern: name and unit price are
/// frozen at the time of sale.
///
/// References at most one of {product, bundle}; a variant line also carries
/// its parent product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub bundle_id: Option<i64>,
    /// Display name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in centavos at time of sale (frozen).
    pub unit_price_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregate sales figures for a branch over a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub completed_count: i64,
    pub completed_total_cents: i64,
    pub refunded_count: i64,
    pub refunded_total_cents: i64,
    pub discount_total_cents: i64,
}

impl SalesSummary {
    /// Completed revenue; refunded sales are already excluded.
    #[inline]
    pub fn net_total(&self) -> Money {
        Money::from_cents(self.completed_total_cents)
    }
}

// =============================================================================
// Offline Checkout Queue
// =============================================================================

/// Processing state of a buffered checkout command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum QueueStatus {
    Pending,
    Applied,
    Rejected,
}

/// A checkout captured while the till was offline, waiting to be replayed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OfflineCheckout {
    /// Client-generated command id; replays with the same id are no-ops.
    pub command_id: String,
    pub branch_id: String,
    /// The `CheckoutRequest` as JSON.
    pub payload: String,
    pub status: QueueStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub sale_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub processed_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
