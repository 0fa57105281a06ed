//! Tuckshop is a prepaid-wallet service for a campus store: students hold
//! balances keyed by admission number and class code, admins record deposits,
//! expenses and stock purchases, and anyone with a terminal can look up a
//! balance by admission number or class code.
//!
//! This library provides the ledger core and a JSON REST API over it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod balance;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod ledger;
mod logging;
mod pagination;
mod routing;
mod stock;
mod student;

pub use app_state::AppState;
pub use balance::{
    ClassBalances, ClassSummary, get_balance_by_admission_number, get_class_balances,
};
pub use db::initialize as initialize_db;
pub use ledger::{
    PaymentMethod, Purchase, PurchasePolicy, Transaction, TransactionKind, apply_purchase,
    apply_transaction,
};
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use stock::{
    StockItem, StockItemForm, StockItemId, create_stock_item, delete_stock_item, get_stock_item,
    list_stock_items, update_stock_item,
};
pub use student::{ClassCodes, Student, StudentId, register_student};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The student ID or admission number does not refer to a registered
    /// student.
    #[error("the student could not be found")]
    StudentNotFound,

    /// The stock item ID does not refer to an item in the catalog.
    #[error("the stock item could not be found")]
    ItemNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The admission number used to register a student already exists in the
    /// database.
    #[error("the admission number \"{0}\" is already registered")]
    DuplicateAdmissionNumber(String),

    /// A transaction was given an amount that is zero, negative or not a
    /// finite number.
    #[error("{0} is not a valid transaction amount")]
    InvalidAmount(f64),

    /// A quantity was zero or negative where a positive count is required, or
    /// negative where a non-negative count is required.
    #[error("{0} is not a valid quantity")]
    InvalidQuantity(i64),

    /// A stock item price was negative or not a finite number.
    #[error("{0} is not a valid price")]
    InvalidPrice(f64),

    /// The class code is not one of the configured class codes.
    #[error("\"{0}\" is not a recognised class code")]
    InvalidClassCode(String),

    /// An empty string was used where a name is required.
    #[error("name cannot be empty")]
    EmptyName,

    /// An empty string was used where an admission number is required.
    #[error("admission number cannot be empty")]
    EmptyAdmissionNumber,

    /// A purchase requested more units than the stock item has on hand.
    ///
    /// The stock quantity is left untouched when this error is returned.
    #[error("requested {requested} units but only {available} are in stock")]
    InsufficientStock {
        /// The number of units the purchase asked for.
        requested: i64,
        /// The number of units on hand when the purchase was attempted.
        available: i64,
    },

    /// A purchase would drive the student's balance below zero while the
    /// balance-sufficiency policy is enabled.
    ///
    /// This error cannot occur under the default policy, which permits
    /// overdrafts.
    #[error("balance {balance} cannot cover a purchase of {required}")]
    InsufficientBalance {
        /// The student's balance when the purchase was attempted.
        balance: f64,
        /// The total price of the rejected purchase.
        required: f64,
    },

    /// Could not acquire the database lock.
    ///
    /// No effect was committed; the caller may retry.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// The database reported that it is busy or locked by another writer.
    ///
    /// No effect was committed; the caller may retry.
    #[error("the database is busy")]
    DatabaseBusy,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::SqliteFailure(sql_error, _)
                if matches!(
                    sql_error.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Error::DatabaseBusy
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// A stable machine-readable code for the error, used in JSON error
    /// bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::StudentNotFound => "student_not_found",
            Error::ItemNotFound => "item_not_found",
            Error::NotFound => "not_found",
            Error::DuplicateAdmissionNumber(_) => "duplicate_admission_number",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::InvalidQuantity(_) => "invalid_quantity",
            Error::InvalidPrice(_) => "invalid_price",
            Error::InvalidClassCode(_) => "invalid_class_code",
            Error::EmptyName => "empty_name",
            Error::EmptyAdmissionNumber => "empty_admission_number",
            Error::InsufficientStock { .. } => "insufficient_stock",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::DatabaseLock | Error::DatabaseBusy => "unavailable",
            Error::SqlError(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::StudentNotFound | Error::ItemNotFound | Error::NotFound => {
                StatusCode::NOT_FOUND
            }
            Error::DuplicateAdmissionNumber(_) => StatusCode::CONFLICT,
            Error::InvalidAmount(_)
            | Error::InvalidQuantity(_)
            | Error::InvalidPrice(_)
            | Error::InvalidClassCode(_)
            | Error::EmptyName
            | Error::EmptyAdmissionNumber
            | Error::InsufficientStock { .. }
            | Error::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::DatabaseLock | Error::DatabaseBusy => StatusCode::SERVICE_UNAVAILABLE,
            Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Error::SqlError(ref error) = self {
            tracing::error!("responding with internal error: {error}");
        }

        let body = json!({
            "error": self.code(),
            "detail": self.to_string(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use super::Error;

    #[test]
    fn not_found_maps_to_404() {
        for error in [Error::StudentNotFound, Error::ItemNotFound, Error::NotFound] {
            assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn conflict_maps_to_409() {
        let error = Error::DuplicateAdmissionNumber("S1001".to_owned());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_errors_map_to_422() {
        let errors = [
            Error::InvalidAmount(-1.0),
            Error::InvalidQuantity(0),
            Error::InsufficientStock {
                requested: 3,
                available: 1,
            },
        ];

        for error in errors {
            assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn unavailable_maps_to_503_and_shares_a_code() {
        assert_eq!(
            Error::DatabaseLock.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(Error::DatabaseLock.code(), Error::DatabaseBusy.code());
    }

    #[test]
    fn query_returned_no_rows_becomes_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(error, Error::NotFound);
    }
}
