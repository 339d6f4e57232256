//! Offline checkout buffer.
//!
//! A till that lost connectivity keeps taking sales, tags each with a UUID
//! and posts them here once it is back. Resends of the same command id are
//! accepted and ignored.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use aurora_core::{
    EnqueueCheckoutRequest, OfflineCheckout, ReplayReport, ReplayRequest, ValidationError,
};

use crate::error::ApiResult;
use crate::AppState;

/// Largest batch a single replay call may drain.
const MAX_REPLAY_BATCH: i64 = 500;

/// `POST /api/offline-queue`
///
/// 201 when the command is new, 200 when it was already queued.
pub async fn enqueue(
    State(state): State<AppState>,
    payload: Result<Json<EnqueueCheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OfflineCheckout>)> {
    let Json(request) = payload?;
    debug!(command_id = %request.command_id, "POST /api/offline-queue");

    let (queued, inserted) = state
        .db
        .engine()
        .enqueue_offline(&request.command_id, &request.checkout)
        .await?;

    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(queued)))
}

/// `POST /api/offline-queue/replay?limit=N`
pub async fn replay(
    State(state): State<AppState>,
    query: Result<Query<ReplayRequest>, QueryRejection>,
) -> ApiResult<Json<ReplayReport>> {
    let Query(request) = query?;
    if !(1..=MAX_REPLAY_BATCH).contains(&request.limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_REPLAY_BATCH,
        }
        .into());
    }

    Ok(Json(state.db.engine().replay_offline(request.limit).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::routes::test_support::{expect_error, read_json, TestApp};

    #[tokio::test]
    async fn test_enqueue_then_replay() {
        let t = TestApp::new().await;
        let command_id = Uuid::new_v4().to_string();
        let body = json!({ "commandId": command_id, "checkout": t.vitamin_checkout(3) });

        let response = t
            .send(Method::POST, "/api/offline-queue", Some(body.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let queued: Value = read_json(response).await;
        assert_eq!(queued["status"], "pending");

        // Till resends after a timeout.
        let response = t.send(Method::POST, "/api/offline-queue", Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(t.vitamin_stock().await, Some(10));

        let response = t
            .send(Method::POST, "/api/offline-queue/replay", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let report: Value = read_json(response).await;
        assert_eq!(report["applied"], 1);
        assert_eq!(report["rejected"], 0);
        assert_eq!(report["outcomes"][0]["commandId"], command_id.as_str());
        assert_eq!(report["outcomes"][0]["status"], "applied");

        assert_eq!(t.vitamin_stock().await, Some(7));
    }

    #[tokio::test]
    async fn test_replay_reports_rejection() {
        let t = TestApp::new().await;
        let body = json!({
            "commandId": Uuid::new_v4().to_string(),
            "checkout": t.vitamin_checkout(12)
        });
        t.send(Method::POST, "/api/offline-queue", Some(body)).await;

        let response = t
            .send(Method::POST, "/api/offline-queue/replay?limit=10", None)
            .await;
        let report: Value = read_json(response).await;
        assert_eq!(report["applied"], 0);
        assert_eq!(report["rejected"], 1);
        assert_eq!(report["outcomes"][0]["status"], "rejected");
        assert_eq!(t.vitamin_stock().await, Some(10));
    }

    #[tokio::test]
    async fn test_enqueue_and_replay_validation() {
        let t = TestApp::new().await;

        let body = json!({ "commandId": "till-3-0001", "checkout": t.vitamin_checkout(1) });
        let response = t.send(Method::POST, "/api/offline-queue", Some(body)).await;
        expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION").await;

        let response = t
            .send(Method::POST, "/api/offline-queue/replay?limit=0", None)
            .await;
        expect_error(response, StatusCode::BAD_REQUEST, "VALIDATION").await;
    }
}
