//! # Repository Module
//!
//! Pool-backed data access for everything outside the transaction engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Route handler                                                          │
//! │       │   db.stock().list_for_branch("BR-MAIN")                         │
//! │       ▼                                                                 │
//! │  StockRepository ──► SQL ──► SQLite                                     │
//! │                                                                         │
//! │  Writes that must be atomic with a sale (stock deltas, status,          │
//! │  store credit during checkout/refund) live in `engine::ledger`,         │
//! │  not here.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`BranchRepository`] - Branch directory
//! - [`CatalogRepository`] - Products, variants, bundles
//! - [`StockRepository`] - Per-branch stock levels (admin edits and reads)
//! - [`CustomerRepository`] - Customer records and store credit edits
//! - [`SaleRepository`] - Sale lookup and reporting
//! - [`OfflineQueueRepository`] - Buffered offline checkouts

pub mod branch;
pub mod catalog;
pub mod customer;
pub mod offline_queue;
pub mod sale;
pub mod stock;

pub use branch::BranchRepository;
pub use catalog::{CatalogRepository, NewProduct};
pub use customer::{CustomerRepository, NewCustomer};
pub use offline_queue::OfflineQueueRepository;
pub use sale::{SaleRepository, SaleWithItems};
pub use stock::{BranchStock, ProductStockLevel, StockRepository, VariantStockLevel};
