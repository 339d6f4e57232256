//! # aurora-core: Domain Model for Aurora POS
//!
//! Pure types and rules shared by the storage layer and the HTTP surface.
//! Nothing in here touches a database, a socket or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Aurora POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/server (axum)                             │   │
//! │  │     POST /api/checkout ──► POST /api/sales/{id}/refund          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ CheckoutRequest / RefundRequest        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ aurora-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  request  │  │ validation│  │   │
//! │  │   │  Branch   │  │   Money   │  │ Checkout  │  │   rules   │  │   │
//! │  │   │  Sale     │  │           │  │ Refund    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          aurora-db (SQLite, repositories, engine)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Branch, Product, Sale, ...) and the sale state machine
//! - [`request`] - Typed checkout/refund request and response records
//! - [`money`] - Integer minor-unit money
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use aurora_core::money::Money;
//!
//! let price = Money::from_cents(15_000); // ₱150.00
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 45_000);
//! ```

pub mod error;
pub mod money;
pub mod request;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use request::*;
pub use types::*;

/// Category name for products that never consume stock.
///
/// Categories are an open set of strings; this is the only one the
/// transaction engine treats specially.
pub const SERVICE_CATEGORY: &str = "Service";

/// Maximum lines (items + bundles) accepted in a single checkout.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches fat-finger input (typing 1000 instead of 10) before it reaches
/// the stock ledger.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Largest amount, in centavos, a single price, discount or total may carry.
///
/// ₱10 billion. Store-credit balances grow by sale totals, so this keeps
/// them far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;
