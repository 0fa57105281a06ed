//! Defines the endpoint for recording a deposit or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, student::StudentId};

use super::transaction::{
    PaymentMethod, Transaction, TransactionKind, apply_transaction,
};

/// The state needed to record a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for recording a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// The student whose wallet to credit or debit.
    pub student_id: StudentId,
    /// Whether this is a deposit or an expense.
    pub kind: TransactionKind,
    /// The amount of money. Must be positive.
    pub amount: f64,
    /// How the money changed hands.
    pub method: PaymentMethod,
    /// An optional free-text note.
    pub note: Option<String>,
}

/// A route handler for recording a deposit or expense against a student's
/// wallet.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let mut builder = Transaction::build(form.student_id, form.kind, form.amount, form.method);
    if let Some(ref note) = form.note {
        builder = builder.note(note);
    }

    let transaction = apply_transaction(builder, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
