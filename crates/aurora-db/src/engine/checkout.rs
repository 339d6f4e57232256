//! # Checkout
//!
//! Records one sale atomically.
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0. validate_checkout(request)              shape only, no database     │
//! │                                                                         │
//! │  ── BEGIN ───────────────────────────────────────────────────────────── │
//! │  1. Plan (reads only)                                                   │
//! │     ├── branch, customer, products, variants, bundles exist             │
//! │     ├── resolve every line to its stock row (services → none)           │
//! │     └── sum demand per stock row, compare with on-hand                  │
//! │           └── short anywhere? → InsufficientStock, nothing written      │
//! │  2. INSERT sale (completed)                                             │
//! │  3. per item line:   INSERT sale_item, decrement product/variant stock  │
//! │  4. per bundle line: INSERT one sale_item, decrement each constituent   │
//! │  5. Store Credit?    re-read balance, debit or InsufficientStoreCredit  │
//! │  ── COMMIT ──────────────────────────────────────────────────────────── │
//! │                                                                         │
//! │  Any error between BEGIN and COMMIT rolls back steps 2-5.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use super::error::EngineResult;
use super::ledger::{Constituent, Ledger, NewSaleItem, StockKey};
use aurora_core::validation::{add_units, validate_checkout};
use aurora_core::{
    CheckoutBundleLine, CheckoutItemLine, CheckoutRequest, CoreError, StockTarget,
    ValidationError,
};

/// An item line with its resolved stock row.
struct PlannedItem<'r> {
    line: &'r CheckoutItemLine,
    stock: Option<StockKey>,
}

/// A bundle line with its constituents expanded.
struct PlannedBundle<'r> {
    line: &'r CheckoutBundleLine,
    name: String,
    constituents: Vec<Constituent>,
}

/// Units requested from one stock row across the whole cart.
struct Demand {
    name: String,
    requested: i64,
}

struct CheckoutPlan<'r> {
    items: Vec<PlannedItem<'r>>,
    bundles: Vec<PlannedBundle<'r>>,
}

/// Runs a checkout on an open transaction and returns the new sale id.
///
/// The caller owns the transaction: commit on `Ok`, roll back on `Err`.
pub(crate) async fn checkout_in(
    conn: &mut SqliteConnection,
    request: &CheckoutRequest,
) -> EngineResult<i64> {
    validate_checkout(request)?;

    let mut ledger = Ledger::new(conn);
    let branch_id = request.branch_id.as_str();

    let plan = plan(&mut ledger, request).await?;

    // ---- writes start here -------------------------------------------------

    let sale_id = ledger.insert_sale(request, Utc::now()).await?;
    debug!(sale_id, branch_id = %branch_id, "Sale row inserted");

    for item in &plan.items {
        ledger
            .insert_sale_item(
                sale_id,
                NewSaleItem {
                    product_id: Some(item.line.product_id),
                    variant_id: item.line.variant_id,
                    bundle_id: None,
                    name: &item.line.name,
                    quantity: item.line.quantity,
                    unit_price_cents: item.line.unit_price_cents,
                },
            )
            .await?;

        if let Some(key) = item.stock {
            take(&mut ledger, key, branch_id, &item.line.name, item.line.quantity).await?;
        }
    }

    for bundle in &plan.bundles {
        ledger
            .insert_sale_item(
                sale_id,
                NewSaleItem {
                    product_id: None,
                    variant_id: None,
                    bundle_id: Some(bundle.line.bundle_id),
                    name: &bundle.name,
                    quantity: bundle.line.quantity,
                    unit_price_cents: bundle.line.unit_price_cents,
                },
            )
            .await?;

        for constituent in bundle.constituents.iter().filter(|c| !c.is_service()) {
            take(
                &mut ledger,
                StockKey::Product(constituent.product_id),
                branch_id,
                &constituent.name,
                constituent.units_for(bundle.line.quantity)?,
            )
            .await?;
        }
    }

    if request.payment_method.is_store_credit() {
        // validate_checkout guarantees the customer id.
        let customer_id = request
            .customer_id
            .ok_or_else(|| ValidationError::Required {
                field: "customerId".to_string(),
            })?;
        debit_store_credit(&mut ledger, customer_id, request.total_amount_cents).await?;
    }

    Ok(sale_id)
}

/// Validation pass: every read the checkout needs, no writes.
async fn plan<'r>(
    ledger: &mut Ledger<'_>,
    request: &'r CheckoutRequest,
) -> EngineResult<CheckoutPlan<'r>> {
    let branch_id = request.branch_id.as_str();

    if !ledger.branch_exists(branch_id).await? {
        return Err(CoreError::unknown("Branch", branch_id).into());
    }
    if let Some(customer_id) = request.customer_id {
        if !ledger.customer_exists(customer_id).await? {
            return Err(CoreError::unknown("Customer", customer_id).into());
        }
    }

    let mut demand: BTreeMap<StockKey, Demand> = BTreeMap::new();

    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let product = ledger
            .product(line.product_id)
            .await?
            .ok_or_else(|| CoreError::unknown("Product", line.product_id))?;

        if let Some(variant_id) = line.variant_id {
            let variant = ledger
                .variant(variant_id)
                .await?
                .ok_or_else(|| CoreError::unknown("Variant", variant_id))?;
            if variant.product_id != product.id {
                return Err(ValidationError::Inconsistent {
                    field: "variantId".to_string(),
                    reason: format!("variant {} does not belong to product {}", variant.id, product.id),
                }
                .into());
            }
        }

        let target = StockTarget::resolve(
            Some(line.product_id),
            line.variant_id,
            None,
            Some(&product.category),
        );
        let stock = StockKey::for_target(target);
        if let Some(key) = stock {
            add_demand(&mut demand, key, &line.name, line.quantity)?;
        }
        items.push(PlannedItem { line, stock });
    }

    let mut bundles = Vec::with_capacity(request.bundles.len());
    for line in &request.bundles {
        let bundle = ledger
            .bundle(line.bundle_id)
            .await?
            .ok_or_else(|| CoreError::unknown("Bundle", line.bundle_id))?;
        let constituents = ledger.bundle_constituents(bundle.id).await?;

        for constituent in constituents.iter().filter(|c| !c.is_service()) {
            add_demand(
                &mut demand,
                StockKey::Product(constituent.product_id),
                &constituent.name,
                constituent.units_for(line.quantity)?,
            )?;
        }
        bundles.push(PlannedBundle {
            line,
            name: bundle.name,
            constituents,
        });
    }

    for (key, wanted) in &demand {
        let available = ledger.available(*key, branch_id).await?;
        if wanted.requested > available {
            return Err(CoreError::InsufficientStock {
                item: wanted.name.clone(),
                available,
                requested: wanted.requested,
            }
            .into());
        }
    }

    Ok(CheckoutPlan { items, bundles })
}

fn add_demand(
    demand: &mut BTreeMap<StockKey, Demand>,
    key: StockKey,
    name: &str,
    units: i64,
) -> Result<(), ValidationError> {
    let entry = demand.entry(key).or_insert_with(|| Demand {
        name: name.to_string(),
        requested: 0,
    });
    entry.requested = add_units(entry.requested, units)?;
    Ok(())
}

/// Guarded decrement; a miss means the plan's read is no longer true.
async fn take(
    ledger: &mut Ledger<'_>,
    key: StockKey,
    branch_id: &str,
    name: &str,
    units: i64,
) -> EngineResult<()> {
    if ledger.decrement(key, branch_id, units).await? {
        return Ok(());
    }
    let available = ledger.available(key, branch_id).await?;
    Err(CoreError::InsufficientStock {
        item: name.to_string(),
        available,
        requested: units,
    }
    .into())
}

async fn debit_store_credit(
    ledger: &mut Ledger<'_>,
    customer_id: i64,
    total_cents: i64,
) -> EngineResult<()> {
    let balance = ledger
        .store_credit(customer_id)
        .await?
        .ok_or_else(|| CoreError::unknown("Customer", customer_id))?;

    if balance < total_cents || !ledger.debit_store_credit(customer_id, total_cents).await? {
        return Err(CoreError::InsufficientStoreCredit {
            customer_id,
            balance_cents: balance,
            required_cents: total_cents,
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
