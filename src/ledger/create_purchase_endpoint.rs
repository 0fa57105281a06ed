//! Defines the endpoint for recording a stock purchase.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, stock::StockItemId, student::StudentId};

use super::purchase::{Purchase, PurchasePolicy, apply_purchase};

/// The state needed to record a purchase.
#[derive(Debug, Clone)]
pub struct CreatePurchaseState {
    /// The database connection for the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Whether purchases must be covered by the student's balance.
    pub purchase_policy: PurchasePolicy,
}

impl FromRef<AppState> for CreatePurchaseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            purchase_policy: state.purchase_policy,
        }
    }
}

/// The request body for recording a purchase.
#[derive(Debug, Deserialize)]
pub struct PurchaseForm {
    /// The student to charge.
    pub student_id: StudentId,
    /// The stock item being bought.
    pub item_id: StockItemId,
    /// The number of units. Must be positive.
    pub quantity: i64,
}

/// A route handler for charging a student for stock.
///
/// The response carries the computed `total_price` and `profit` from the
/// prices snapshotted at commit time.
pub async fn create_purchase_endpoint(
    State(state): State<CreatePurchaseState>,
    Json(form): Json<PurchaseForm>,
) -> Result<(StatusCode, Json<Purchase>), Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let purchase = apply_purchase(
        form.student_id,
        form.item_id,
        form.quantity,
        state.purchase_policy,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(purchase)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        db::initialize,
        endpoints,
        ledger::{PaymentMethod, PurchasePolicy, Transaction, TransactionKind, apply_transaction},
        stock::{StockItemForm, StockItemId, create_stock_item},
        student::{ClassCodes, StudentId, register_student},
    };

    use super::{CreatePurchaseState, create_purchase_endpoint};

    fn get_test_state(policy: PurchasePolicy) -> (CreatePurchaseState, StudentId, StockItemId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let student =
            register_student("Asha Rao", "S1001", "S1", &ClassCodes::default(), &connection)
                .unwrap();
        apply_transaction(
            Transaction::build(student.id, TransactionKind::Deposit, 500.0, PaymentMethod::Cash),
            &connection,
        )
        .unwrap();
        let item = create_stock_item(
            &StockItemForm {
                item_name: "Biscuits".to_owned(),
                quantity: 10,
                cost_price: 50.0,
                selling_price: 80.0,
            },
            &connection,
        )
        .unwrap();

        (
            CreatePurchaseState {
                db_connection: Arc::new(Mutex::new(connection)),
                purchase_policy: policy,
            },
            student.id,
            item.id,
        )
    }

    fn get_test_server(state: CreatePurchaseState) -> TestServer {
        let app = Router::new()
            .route(endpoints::PURCHASES, post(create_purchase_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn records_a_purchase_with_computed_totals() {
        let (state, student_id, item_id) = get_test_state(PurchasePolicy::default());
        let server = get_test_server(state);

        let response = server
            .post(endpoints::PURCHASES)
            .json(&json!({
                "student_id": student_id,
                "item_id": item_id,
                "quantity": 3,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["unit_price"], 80.0);
        assert_eq!(body["total_price"], 240.0);
        assert_eq!(body["profit"], 90.0);
    }

    #[tokio::test]
    async fn oversized_purchase_returns_insufficient_stock() {
        let (state, student_id, item_id) = get_test_state(PurchasePolicy::default());
        let server = get_test_server(state);

        let response = server
            .post(endpoints::PURCHASES)
            .json(&json!({
                "student_id": student_id,
                "item_id": item_id,
                "quantity": 11,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "insufficient_stock");
    }

    #[tokio::test]
    async fn balance_policy_is_enforced_when_configured() {
        let policy = PurchasePolicy {
            require_sufficient_balance: true,
        };
        let (state, student_id, item_id) = get_test_state(policy);
        let server = get_test_server(state);

        // 7 units at 80 cost 560, above the 500 deposit.
        let response = server
            .post(endpoints::PURCHASES)
            .json(&json!({
                "student_id": student_id,
                "item_id": item_id,
                "quantity": 7,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "insufficient_balance");
    }
}
