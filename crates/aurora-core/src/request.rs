//! # Request and Response Records
//!
//! Typed bodies for the two engine operations and the offline replay
//! report. Field names are camelCase on the wire to match the cashier UI.
//!
//! ```text
//! POST /api/checkout              CheckoutRequest  ──► CheckoutResponse { saleId }
//! POST /api/sales/{id}/refund     RefundRequest    ──► RefundResponse   { success }
//! POST /api/offline-queue/replay  ReplayRequest    ──► ReplayReport
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, QueueStatus};

// =============================================================================
// Checkout
// =============================================================================

/// A standalone product, variant or service line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutItemLine {
    pub product_id: i64,
    #[serde(default)]
    pub variant_id: Option<i64>,
    pub quantity: i64,
    /// Price per unit at the time of sale, in centavos.
    pub unit_price_cents: i64,
    /// Category as displayed by the till. Informational only: the engine
    /// ignores it and decides service exclusion from the catalog's stored
    /// category, so a stocked product sent as "Service" still decrements
    /// stock.
    #[serde(default)]
    pub category: String,
    /// Display name snapshot written to the sale item.
    pub name: String,
}

/// A bundle line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutBundleLine {
    pub bundle_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Everything the engine needs to record one sale.
///
/// The branch is explicit on every request; there is no "current branch".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    pub branch_id: String,
    #[serde(default)]
    pub items: Vec<CheckoutItemLine>,
    #[serde(default)]
    pub bundles: Vec<CheckoutBundleLine>,
    /// Already resolved to an amount by the caller.
    #[serde(default)]
    pub discount_amount_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub customer_id: Option<i64>,
    /// Amount to charge. Trusted as supplied.
    pub total_amount_cents: i64,
}

impl CheckoutRequest {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// Number of cart lines (items plus bundles).
    #[inline]
    pub fn line_count(&self) -> usize {
        self.items.len() + self.bundles.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutResponse {
    pub sale_id: i64,
}

// =============================================================================
// Refund
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RefundRequest {
    #[serde(default)]
    pub refund_to_store_credit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RefundResponse {
    pub success: bool,
}

// =============================================================================
// Offline Queue
// =============================================================================

/// Body of `POST /api/offline-queue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EnqueueCheckoutRequest {
    /// Generated by the till when the checkout was captured offline.
    pub command_id: String,
    pub checkout: CheckoutRequest,
}

/// Query of `POST /api/offline-queue/replay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReplayRequest {
    #[serde(default = "default_replay_limit")]
    pub limit: i64,
}

fn default_replay_limit() -> i64 {
    50
}

impl Default for ReplayRequest {
    fn default() -> Self {
        ReplayRequest {
            limit: default_replay_limit(),
        }
    }
}

/// Outcome of one replayed command.
///
/// `status` is `applied` (with `saleId`), `rejected` (with `reason`), or
/// `pending` when a storage failure deferred it to the next replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReplayOutcome {
    pub command_id: String,
    pub status: QueueStatus,
    pub sale_id: Option<i64>,
    pub reason: Option<String>,
}

impl ReplayOutcome {
    pub fn applied(command_id: impl Into<String>, sale_id: i64) -> Self {
        ReplayOutcome {
            command_id: command_id.into(),
            status: QueueStatus::Applied,
            sale_id: Some(sale_id),
            reason: None,
        }
    }

    pub fn rejected(command_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ReplayOutcome {
            command_id: command_id.into(),
            status: QueueStatus::Rejected,
            sale_id: None,
            reason: Some(reason.into()),
        }
    }

    pub fn deferred(command_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ReplayOutcome {
            command_id: command_id.into(),
            status: QueueStatus::Pending,
            sale_id: None,
            reason: Some(reason.into()),
        }
    }
}

/// Summary of a replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReplayReport {
    pub applied: usize,
    pub rejected: usize,
    pub deferred: usize,
    pub outcomes: Vec<ReplayOutcome>,
}

impl ReplayReport {
    pub fn record(&mut self, outcome: ReplayOutcome) {
        match outcome.status {
            QueueStatus::Applied => self.applied += 1,
            QueueStatus::Rejected => self.rejected += 1,
            QueueStatus::Pending => self.deferred += 1,
        }
        self.outcomes.push(outcome);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
