//! # Validation Module
//!
//! Shape checks on incoming requests. Everything here runs before the
//! engine opens a transaction; stock and credit checks need the database
//! and live in aurora-db.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: serde          → wrong types / missing fields (HTTP 422)     │
//! │  Layer 2: THIS MODULE    → quantities, amounts, required fields        │
//! │  Layer 3: engine         → stock, store credit, unknown references     │
//! │  Layer 4: SQLite         → CHECK (quantity >= 0), FOREIGN KEY          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::request::CheckoutRequest;
use crate::{MAX_AMOUNT_CENTS, MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
///
/// ```rust
/// use aurora_core::validation::validate_quantity;
///
/// assert!(validate_quantity(3).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in centavos. Zero is allowed (free items, no discount).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_AMOUNT_CENTS
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Units of a constituent consumed by `bundles` bundles.
///
/// ```rust
/// use aurora_core::validation::bundle_units;
///
/// assert_eq!(bundle_units(2, 3), Ok(6));
/// assert!(bundle_units(i64::MAX / 2, 3).is_err());
/// ```
pub fn bundle_units(per_bundle: i64, bundles: i64) -> ValidationResult<i64> {
    per_bundle.checked_mul(bundles).ok_or_else(unit_overflow)
}

/// Adds `units` to a running per-row demand.
pub fn add_units(total: i64, units: i64) -> ValidationResult<i64> {
    total.checked_add(units).ok_or_else(unit_overflow)
}

fn unit_overflow() -> ValidationError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: i64::MAX,
    }
}

/// Validates a required, non-blank string field.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates the shape of a checkout request.
///
/// ## Rules
/// - `branchId` is required
/// - At least one line, at most MAX_CART_LINES
/// - Every quantity in 1..=999
/// - Prices, discount and total in 0..=MAX_AMOUNT_CENTS
/// - Store Credit payments carry a `customerId`
pub fn validate_checkout(request: &CheckoutRequest) -> ValidationResult<()> {
    validate_required("branchId", &request.branch_id)?;

    let lines = request.line_count();
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if lines > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    for item in &request.items {
        validate_quantity(item.quantity)?;
        validate_amount("unitPriceCents", item.unit_price_cents)?;
    }
    for bundle in &request.bundles {
        validate_quantity(bundle.quantity)?;
        validate_amount("unitPriceCents", bundle.unit_price_cents)?;
    }

    validate_amount("discountAmountCents", request.discount_amount_cents)?;
    validate_amount("totalAmountCents", request.total_amount_cents)?;

    if request.payment_method.is_store_credit() && request.customer_id.is_none() {
        return Err(ValidationError::Inconsistent {
            field: "customerId".to_string(),
            reason: "required when paying with Store Credit".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
