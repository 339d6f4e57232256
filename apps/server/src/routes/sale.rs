//! Checkout, refund and receipt endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use aurora_core::{CheckoutRequest, CheckoutResponse, RefundRequest, RefundResponse};
use aurora_db::repository::SaleWithItems;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `POST /api/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    let Json(request) = payload?;
    debug!(
        branch_id = %request.branch_id,
        lines = request.line_count(),
        "POST /api/checkout"
    );

    let sale_id = state.db.engine().checkout(&request).await?;
    Ok((StatusCode::CREATED, Json(CheckoutResponse { sale_id })))
}

/// `POST /api/sales/{id}/refund`
pub async fn refund(
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
    payload: Result<Json<RefundRequest>, JsonRejection>,
) -> ApiResult<Json<RefundResponse>> {
    let Json(request) = payload?;
    debug!(sale_id, refund_to_store_credit = request.refund_to_store_credit, "POST refund");

    state
        .db
        .engine()
        .refund(sale_id, request.refund_to_store_credit)
        .await?;
    Ok(Json(RefundResponse { success: true }))
}

/// `GET /api/sales/{id}`
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<i64>,
) -> ApiResult<Json<SaleWithItems>> {
    state
        .db
        .sales()
        .get_with_items(sale_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))
}
