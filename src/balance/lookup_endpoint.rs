//! Defines the endpoint for looking up balances by admission number or class
//! code.
//!
//! A single query string serves both cases, the way the balance-check
//! terminal works: "S1" is a class code and returns the whole class, while
//! "S1001" is an admission number and returns one student.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    student::{ClassCodes, Student},
};

use super::core::{ClassBalances, get_balance_by_admission_number, get_class_balances};

/// The state needed to look up balances.
#[derive(Debug, Clone)]
pub struct BalanceLookupState {
    /// The database connection for reading students.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The class codes this deployment accepts, used to dispatch the query.
    pub class_codes: ClassCodes,
}

impl FromRef<AppState> for BalanceLookupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            class_codes: state.class_codes.clone(),
        }
    }
}

/// The result of a balance lookup: a single student or a whole class.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BalanceLookup {
    /// The query matched an admission number.
    Student {
        /// The student's current wallet state.
        student: Student,
    },
    /// The query matched a configured class code.
    Class(ClassBalances),
}

/// A route handler that resolves a query string to a balance result.
///
/// Queries matching a configured class code return the whole class with
/// summed totals; anything else is treated as an admission number. An empty
/// class is a normal result, while an unknown admission number is `404`.
pub async fn balance_lookup_endpoint(
    State(state): State<BalanceLookupState>,
    Path(query): Path<String>,
) -> Result<Json<BalanceLookup>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let query = query.trim();

    let result = if state.class_codes.contains(query) {
        BalanceLookup::Class(get_class_balances(query, &connection)?)
    } else {
        BalanceLookup::Student {
            student: get_balance_by_admission_number(query, &connection)?,
        }
    };

    Ok(Json(result))
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
        student::{ClassCodes, register_student},
    };

    use super::{BalanceLookupState, balance_lookup_endpoint};

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let codes = ClassCodes::default();
        for (name, admission_no, class_code, deposit) in [
            ("Asha Rao", "S1001", "S1", 10.0),
            ("Benoy Das", "S1002", "S1", 20.0),
            ("Charu Menon", "D2001", "D1", 99.0),
        ] {
            let student = register_student(name, admission_no, class_code, &codes, &connection)
                .unwrap();
            apply_transaction(
                Transaction::build(student.id, TransactionKind::Deposit, deposit, PaymentMethod::Cash),
                &connection,
            )
            .unwrap();
        }

        let state = BalanceLookupState {
            db_connection: Arc::new(Mutex::new(connection)),
            class_codes: codes,
        };
        let app = Router::new()
            .route(endpoints::BALANCE_LOOKUP, get(balance_lookup_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn admission_number_returns_a_single_student() {
        let server = get_test_server();

        let response = server.get("/api/balances/S1001").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["type"], "student");
        assert_eq!(body["student"]["name"], "Asha Rao");
        assert_eq!(body["student"]["balance"], 10.0);
    }

    #[tokio::test]
    async fn class_code_returns_the_class_with_summary() {
        let server = get_test_server();

        let response = server.get("/api/balances/S1").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["type"], "class");
        assert_eq!(body["students"].as_array().unwrap().len(), 2);
        assert_eq!(body["summary"]["balance"], 30.0);
    }

    #[tokio::test]
    async fn empty_class_is_a_normal_result() {
        let server = get_test_server();

        let response = server.get("/api/balances/D3").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["type"], "class");
        assert!(body["students"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_admission_number_returns_not_found() {
        let server = get_test_server();

        let response = server.get("/api/balances/ZZZ").await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "student_not_found");
    }
}
