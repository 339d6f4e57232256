//! # Error Types
//!
//! Domain-specific error types for aurora-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  aurora-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  aurora-db errors                                                      │
//! │  ├── DbError          - Storage failures                               │
//! │  └── EngineError      - Rejected(CoreError) | Storage(DbError)         │
//! │                                                                         │
//! │  apps/server errors                                                    │
//! │  └── ApiError         - What the cashier UI sees ({ code, error })     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `CoreError` always means "nothing was written": the engine raises
//! them either before its first write or inside the transaction it is about
//! to roll back.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections raised by checkout and refund.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A non-service line asks for more than the branch has on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: 15 × Vitamin C 500mg @ BR-MAIN
    ///      │
    ///      ▼
    /// product_stocks(Vitamin C, BR-MAIN) = 10
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Vitamin C 500mg", available: 10, requested: 15 }
    ///      │
    ///      ▼
    /// UI shows: "Only 10 Vitamin C 500mg in stock" and the cashier edits the cart
    /// ```
    ///
    /// `available` is 0 when the branch has no stock row at all.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Store-credit payment with a balance below the sale total.
    #[error(
        "Insufficient store credit for customer {customer_id}: balance {balance_cents}, required {required_cents}"
    )]
    InsufficientStoreCredit {
        customer_id: i64,
        balance_cents: i64,
        required_cents: i64,
    },

    /// Refund of a sale that does not exist or was already refunded.
    #[error("Sale {sale_id} not found or already refunded")]
    AlreadyRefundedOrNotFound { sale_id: i64 },

    /// A request references a product, variant, bundle, customer or branch
    /// that does not exist.
    #[error("{entity} not found: {id}")]
    UnknownReference { entity: &'static str, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an UnknownReference error.
    pub fn unknown(entity: &'static str, id: impl ToString) -> Self {
        CoreError::UnknownReference {
            entity,
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Two fields contradict each other.
    #[error("{field}: {reason}")]
    Inconsistent { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
