//! Route table.
//!
//! Handlers decode, call one engine or repository method, and encode.
//! No handler holds state between requests.

mod branch;
mod customer;
mod health;
mod offline_queue;
mod sale;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

/// Routes without middleware or state attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/checkout", post(sale::checkout))
        .route("/api/sales/{id}", get(sale::get_sale))
        .route("/api/sales/{id}/refund", post(sale::refund))
        .route("/api/branches", get(branch::list_branches))
        .route("/api/branches/{id}/stock", get(branch::branch_stock))
        .route("/api/branches/{id}/sales/summary", get(branch::sales_summary))
        .route("/api/customers/{id}", get(customer::get_customer))
        .route("/api/offline-queue", post(offline_queue::enqueue))
        .route("/api/offline-queue/replay", post(offline_queue::replay))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Seeded in-memory app and request helpers for route tests.

    use axum::body::Body;
    use axum::http::{Method, Request, Response, StatusCode};
    use axum::Router;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    use aurora_core::{Ownership, Product};
    use aurora_db::repository::{NewCustomer, NewProduct};
    use aurora_db::{Database, DbConfig};

    use crate::{router, AppState};

    pub const BRANCH: &str = "BR-MAIN";

    pub struct TestApp {
        pub app: Router,
        pub db: Database,
        pub vitamin: Product,
        pub consultation: Product,
        pub customer_id: i64,
    }

    impl TestApp {
        /// Main branch with 10 × Vitamin C, a consultation service and a
        /// customer holding ₱500.00 credit.
        pub async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            db.branches()
                .insert(BRANCH, "Main Clinic", Ownership::CompanyOwned)
                .await
                .unwrap();

            let vitamin = db
                .catalog()
                .insert_product(&NewProduct::new("Vitamin C 500mg", "Supplement", 15_000))
                .await
                .unwrap();
            let consultation = db
                .catalog()
                .insert_product(&NewProduct::new("Consultation", "Service", 50_000))
                .await
                .unwrap();
            db.stock()
                .set_product_stock(vitamin.id, BRANCH, 10)
                .await
                .unwrap();
            let customer = db
                .customers()
                .insert(&NewCustomer::new("Ana Reyes").store_credit(50_000))
                .await
                .unwrap();

            TestApp {
                app: router(AppState::new(db.clone())),
                db,
                vitamin,
                consultation,
                customer_id: customer.id,
            }
        }

        /// Cash checkout body for `quantity` × Vitamin C at list price.
        pub fn vitamin_checkout(&self, quantity: i64) -> Value {
            json!({
                "branchId": BRANCH,
                "items": [{
                    "productId": self.vitamin.id,
                    "quantity": quantity,
                    "unitPriceCents": 15_000,
                    "category": "Supplement",
                    "name": "Vitamin C 500mg"
                }],
                "paymentMethod": "Cash",
                "totalAmountCents": 15_000 * quantity
            })
        }

        pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.app.clone().oneshot(request).await.unwrap()
        }

        pub async fn vitamin_stock(&self) -> Option<i64> {
            self.db
                .stock()
                .product_stock(self.vitamin.id, BRANCH)
                .await
                .unwrap()
        }
    }

    pub async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    pub async fn expect_error(response: Response<Body>, status: StatusCode, code: &str) {
        assert_eq!(response.status(), status);
        let body: crate::error::ErrorBody = read_json(response).await;
        assert_eq!(body.code, code, "{}", body.error);
    }
}
