//! # Aurora Server
//!
//! HTTP API for the cashier UI and the branch back office.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /health                                   liveness + DB ping      │
//! │                                                                         │
//! │  POST /api/checkout                             engine.checkout         │
//! │  POST /api/sales/{id}/refund                    engine.refund           │
//! │  GET  /api/sales/{id}                           receipt                 │
//! │                                                                         │
//! │  GET  /api/branches                             branch directory        │
//! │  GET  /api/branches/{id}/stock                  stock levels            │
//! │  GET  /api/branches/{id}/sales/summary          sales report            │
//! │  GET  /api/customers/{id}                       customer + credit       │
//! │                                                                         │
//! │  POST /api/offline-queue                        buffer offline sale     │
//! │  POST /api/offline-queue/replay                 drain buffer            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `AURORA_HTTP_PORT` - listen port (default: 8080)
//! - `AURORA_DB_PATH` - SQLite file (default: ./aurora.db)
//! - `AURORA_DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `AURORA_DB_BUSY_TIMEOUT_MS` - write lock wait (default: 5000)
//! - `RUST_LOG` - log filter (default: `info,aurora=debug,sqlx=warn`)

pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

use aurora_db::Database;

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
