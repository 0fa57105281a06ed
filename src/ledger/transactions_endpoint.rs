//! Defines the endpoints for browsing the transaction ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    pagination::{Page, PaginationConfig},
    student::{StudentId, get_student_by_id},
};

use super::transaction::{
    Transaction, TransactionRecord, count_transactions, list_recent_transactions,
    list_transactions_for_student,
};

/// How many transactions the per-student feed returns.
const STUDENT_FEED_LIMIT: u64 = 10;

/// The state needed to browse the ledger.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls paging.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The paging query parameters for listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of rows per page.
    pub per_page: Option<u64>,
}

/// A page of transactions with paging metadata.
#[derive(Debug, Serialize)]
pub struct TransactionsPage {
    /// The transactions on this page, newest first.
    pub transactions: Vec<TransactionRecord>,
    /// The 1-based page number.
    pub page: u64,
    /// The number of rows per page.
    pub per_page: u64,
    /// The total number of transactions in the ledger.
    pub total: u64,
}

/// A route handler that returns a page of transactions, newest first, with
/// the student each one belongs to.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Query(params): Query<PageParams>,
) -> Result<Json<TransactionsPage>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let page = Page::resolve(params.page, params.per_page, &state.pagination_config);
    let transactions = list_recent_transactions(page, &connection)?;
    let total = count_transactions(&connection)?;

    Ok(Json(TransactionsPage {
        transactions,
        page: page.number,
        per_page: page.size,
        total,
    }))
}

/// A route handler that returns a student's most recent transactions.
///
/// Returns `404` when the student does not exist, as opposed to an empty
/// feed for a student with no transactions yet.
pub async fn student_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    get_student_by_id(student_id, &connection)?;
    let transactions =
        list_transactions_for_student(student_id, STUDENT_FEED_LIMIT, &connection)?;

    Ok(Json(transactions))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        ledger::{PaymentMethod, Transaction, TransactionKind, apply_transaction},
        pagination::PaginationConfig,
        student::{ClassCodes, StudentId, register_student},
    };

    use super::{ListTransactionsState, list_transactions_endpoint, student_transactions_endpoint};

    fn get_test_state() -> (ListTransactionsState, StudentId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let student =
            register_student("Asha Rao", "S1001", "S1", &ClassCodes::default(), &connection)
                .unwrap();
        for amount in [10.0, 20.0, 30.0] {
            apply_transaction(
                Transaction::build(student.id, TransactionKind::Deposit, amount, PaymentMethod::Cash),
                &connection,
            )
            .unwrap();
        }

        (
            ListTransactionsState {
                db_connection: Arc::new(Mutex::new(connection)),
                pagination_config: PaginationConfig::default(),
            },
            student.id,
        )
    }

    #[tokio::test]
    async fn pages_through_transactions_newest_first() {
        let (state, _) = get_test_state();
        let app = Router::new()
            .route(endpoints::TRANSACTIONS, get(list_transactions_endpoint))
            .with_state(state);
        let server = TestServer::try_new(app).unwrap();

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("per_page", 2)
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["total"], 3);
        assert_eq!(body["per_page"], 2);
        assert_eq!(body["transactions"][0]["amount"], 30.0);
        assert_eq!(body["transactions"][0]["student_name"], "Asha Rao");
    }

    #[tokio::test]
    async fn student_feed_returns_their_transactions() {
        let (state, student_id) = get_test_state();
        let app = Router::new()
            .route(
                endpoints::STUDENT_TRANSACTIONS,
                get(student_transactions_endpoint),
            )
            .with_state(state);
        let server = TestServer::try_new(app).unwrap();

        let response = server
            .get(&format!("/api/students/{student_id}/transactions"))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn feed_for_unknown_student_returns_not_found() {
        let (state, _) = get_test_state();
        let app = Router::new()
            .route(
                endpoints::STUDENT_TRANSACTIONS,
                get(student_transactions_endpoint),
            )
            .with_state(state);
        let server = TestServer::try_new(app).unwrap();

        let response = server.get("/api/students/999/transactions").await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
