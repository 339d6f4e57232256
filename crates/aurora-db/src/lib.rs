//! # aurora-db: Storage Layer and Transaction Engine for Aurora POS
//!
//! SQLite storage for every branch, plus the engine that turns a cart into
//! a sale (and a sale back into stock) atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Aurora POS Data Flow                             │
//! │                                                                         │
//! │  POST /api/checkout (apps/server)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     aurora-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │    engine     │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ checkout      │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ refund        │    │ 002_offline  │  │   │
//! │  │   │ WAL + busy    │    │ replay        │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           ▲                                                     │   │
//! │  │           └────────── repositories (branch, catalog, stock,    │   │
//! │  │                        customer, sale, offline_queue)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (aurora.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Plain data access (catalog, stock, sales, ...)
//! - [`engine`] - Checkout, refund and offline replay transactions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aurora_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("aurora.db")).await?;
//!
//! let sale_id = db.engine().checkout(&request).await?;
//! db.engine().refund(sale_id, true).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{EngineError, EngineResult, TransactionEngine};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    BranchRepository, CatalogRepository, CustomerRepository, OfflineQueueRepository,
    SaleRepository, StockRepository,
};
