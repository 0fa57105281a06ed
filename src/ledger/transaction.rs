//! Defines the transaction ledger record and the deposit/expense operation.
//!
//! A transaction and the matching student wallet update always commit
//! together: [apply_transaction] wraps the record insert and the wallet
//! update in one SQL transaction, so the invariant
//! `balance == total_paid - total_spent` holds at every commit point.

use rusqlite::{
    Connection,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    pagination::Page,
    student::{self, StudentId},
};

/// Whether a transaction puts money into a wallet or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money paid into the wallet.
    Deposit,
    /// Money taken out of the wallet without a stock purchase, e.g. a fee.
    Expense,
}

impl TransactionKind {
    fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Expense => "expense",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "deposit" => Ok(TransactionKind::Deposit),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind {other:?}").into(),
            )),
        }
    }
}

/// How the money for a transaction changed hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// An online payment, e.g. UPI.
    Online,
    /// Cash over the counter.
    Cash,
    /// Recorded on credit, to be settled later.
    Credit,
}

impl PaymentMethod {
    fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "online" => Ok(PaymentMethod::Online),
            "cash" => Ok(PaymentMethod::Cash),
            "credit" => Ok(PaymentMethod::Credit),
            other => Err(FromSqlError::Other(
                format!("unknown payment method {other:?}").into(),
            )),
        }
    }
}

/// A deposit into or expense against a student's wallet.
///
/// Transactions are append-only: once created they are never updated or
/// deleted. To create one, use [Transaction::build] and [apply_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The student whose wallet this transaction touched.
    pub student_id: StudentId,
    /// The amount of money deposited or spent. Always positive.
    pub amount: f64,
    /// Whether this was a deposit or an expense.
    pub kind: TransactionKind,
    /// How the money changed hands.
    pub method: PaymentMethod,
    /// A free-text note, e.g. "term 2 pocket money".
    pub note: Option<String>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        student_id: StudentId,
        kind: TransactionKind,
        amount: f64,
        method: PaymentMethod,
    ) -> TransactionBuilder {
        TransactionBuilder {
            student_id,
            kind,
            amount,
            method,
            note: None,
        }
    }
}

/// A builder for recording a transaction with [apply_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The student whose wallet to credit or debit.
    pub student_id: StudentId,
    /// Whether this is a deposit or an expense.
    pub kind: TransactionKind,
    /// The amount of money. Must be positive and finite.
    pub amount: f64,
    /// How the money changed hands.
    pub method: PaymentMethod,
    /// An optional free-text note.
    pub note: Option<String>,
}

impl TransactionBuilder {
    /// Set the note for the transaction.
    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_owned());
        self
    }
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL,
            method TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES student(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_transaction_row(row: &rusqlite::Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        student_id: row.get(1)?,
        amount: row.get(2)?,
        kind: row.get(3)?,
        method: row.get(4)?,
        note: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const TRANSACTION_COLUMNS: &str = "id, student_id, amount, kind, method, note, created_at";

/// Record a deposit or expense against a student's wallet.
///
/// The transaction record and the wallet update commit as a single unit: a
/// deposit adds to `balance` and `total_paid` and stamps `last_payment`, an
/// expense subtracts from `balance` and adds to `total_spent`. Expenses may
/// drive the balance negative; overdrafts are permitted.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero, negative or not finite,
/// - or [Error::StudentNotFound] if the student ID does not refer to a
///   registered student,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// On any error no change is committed.
pub fn apply_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !builder.amount.is_finite() || builder.amount <= 0.0 {
        return Err(Error::InvalidAmount(builder.amount));
    }

    let tx = connection.unchecked_transaction()?;
    let now = OffsetDateTime::now_utc();

    match builder.kind {
        TransactionKind::Deposit => student::credit(builder.student_id, builder.amount, now, &tx)?,
        TransactionKind::Expense => student::debit(builder.student_id, builder.amount, &tx)?,
    }

    let transaction = tx
        .prepare(&format!(
            "INSERT INTO \"transaction\" (student_id, amount, kind, method, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.student_id,
                builder.amount,
                builder.kind,
                builder.method,
                builder.note,
                now,
            ),
            map_transaction_row,
        )?;

    tx.commit()?;

    Ok(transaction)
}

/// A transaction joined with the student it belongs to, for listing views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// The ledger record.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The student's name at the time of the query.
    pub student_name: Option<String>,
    /// The student's admission number at the time of the query.
    pub admission_no: Option<String>,
}

fn map_transaction_record_row(row: &rusqlite::Row) -> Result<TransactionRecord, rusqlite::Error> {
    Ok(TransactionRecord {
        transaction: map_transaction_row(row)?,
        student_name: row.get(7)?,
        admission_no: row.get(8)?,
    })
}

/// Retrieve a page of transactions, newest first, with student details.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_recent_transactions(
    page: Page,
    connection: &Connection,
) -> Result<Vec<TransactionRecord>, Error> {
    let mut stmt = connection.prepare(
        "SELECT t.id, t.student_id, t.amount, t.kind, t.method, t.note, t.created_at,
                s.name, s.admission_no
         FROM \"transaction\" t
         LEFT JOIN student s ON s.id = t.student_id
         ORDER BY t.created_at DESC, t.id DESC
         LIMIT ?1 OFFSET ?2",
    )?;

    let transactions = stmt
        .query_map((page.size, page.offset()), map_transaction_record_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Retrieve a student's most recent transactions, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transactions_for_student(
    student_id: StudentId,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut stmt = connection.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
         WHERE student_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2"
    ))?;

    let transactions = stmt
        .query_map((student_id, limit), map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// The lifetime sum of all deposits.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn sum_deposits(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\" WHERE kind = 'deposit'",
            [],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The lifetime sum of all expenses (not including purchases).
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn sum_expenses(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\" WHERE kind = 'expense'",
            [],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}


#[cfg(test)]
mod apply_transaction_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        student::{ClassCodes, Student, get_student_by_id, register_student},
    };

    use super::{
        PaymentMethod, Transaction, TransactionKind, apply_transaction, count_transactions,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn register_test_student(conn: &Connection) -> Student {
        register_student("Asha Rao", "S1001", "S1", &ClassCodes::default(), conn).unwrap()
    }

    #[test]
    fn deposit_updates_wallet_and_appends_record() {
        let conn = get_test_connection();
        let student = register_test_student(&conn);
        apply_transaction(
            Transaction::build(student.id, TransactionKind::Deposit, 100.0, PaymentMethod::Cash),
            &conn,
        )
        .unwrap();

        let transaction = apply_transaction(
            Transaction::build(student.id, TransactionKind::Deposit, 50.0, PaymentMethod::Online),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.kind, TransactionKind::Deposit);
        assert_eq!(transaction.amount, 50.0);

        let got = get_student_by_id(student.id, &conn).unwrap();
        assert_eq!(got.balance, 150.0);
        assert_eq!(got.total_paid, 150.0);
        assert_eq!(got.total_spent, 0.0);
        assert!(got.last_payment.is_some());
    }

    #[test]
    fn expense_may_drive_balance_below_zero() {
        let conn = get_test_connection();
        let student = register_test_student(&conn);
        apply_transaction(
            Transaction::build(student.id, TransactionKind::Deposit, 10.0, PaymentMethod::Cash),
            &conn,
        )
        .unwrap();

        apply_transaction(
            Transaction::build(student.id, TransactionKind::Expense, 30.0, PaymentMethod::Credit),
            &conn,
        )
        .unwrap();

        let got = get_student_by_id(student.id, &conn).unwrap();
        assert_eq!(got.balance, -20.0);
        assert_eq!(got.total_spent, 30.0);
        assert_eq!(got.balance, got.total_paid - got.total_spent);
    }

    #[test]
    fn expense_does_not_stamp_last_payment() {
        let conn = get_test_connection();
        let student = register_test_student(&conn);

        apply_transaction(
            Transaction::build(student.id, TransactionKind::Expense, 5.0, PaymentMethod::Cash),
            &conn,
        )
        .unwrap();

        let got = get_student_by_id(student.id, &conn).unwrap();
        assert_eq!(got.last_payment, None);
    }

    #[test]
    fn rejects_non_positive_and_non_finite_amounts() {
        let conn = get_test_connection();
        let student = register_test_student(&conn);

        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let result = apply_transaction(
                Transaction::build(student.id, TransactionKind::Deposit, amount, PaymentMethod::Cash),
                &conn,
            );

            assert!(matches!(result, Err(Error::InvalidAmount(_))), "amount {amount}");
        }

        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn unknown_student_commits_nothing() {
        let conn = get_test_connection();

        let result = apply_transaction(
            Transaction::build(99, TransactionKind::Deposit, 10.0, PaymentMethod::Cash),
            &conn,
        );

        assert_eq!(result, Err(Error::StudentNotFound));
        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[test]
    fn note_is_stored_on_the_record() {
        let conn = get_test_connection();
        let student = register_test_student(&conn);

        let transaction = apply_transaction(
            Transaction::build(student.id, TransactionKind::Deposit, 10.0, PaymentMethod::Cash)
                .note("term 2 pocket money"),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.note.as_deref(), Some("term 2 pocket money"));
    }
}
