//! Customer lookup.

use axum::extract::{Path, State};
use axum::Json;

use aurora_core::Customer;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `GET /api/customers/{id}` - includes the current store-credit balance.
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<Customer>> {
    state
        .db
        .customers()
        .get(customer_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Customer", customer_id))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::routes::test_support::{expect_error, read_json, TestApp};

    #[tokio::test]
    async fn test_get_customer_reflects_credit_debit() {
        let t = TestApp::new().await;
        let mut request = t.vitamin_checkout(1);
        request["paymentMethod"] = json!("Store Credit");
        request["customerId"] = json!(t.customer_id);
        t.send(Method::POST, "/api/checkout", Some(request)).await;

        let response = t
            .send(Method::GET, &format!("/api/customers/{}", t.customer_id), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body["name"], "Ana Reyes");
        assert_eq!(body["store_credit_cents"], 35_000);
    }

    #[tokio::test]
    async fn test_missing_customer() {
        let t = TestApp::new().await;
        let response = t.send(Method::GET, "/api/customers/77", None).await;
        expect_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
    }
}
