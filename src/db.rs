//! Database initialization for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    ledger::{create_purchase_table, create_transaction_table},
    stock::create_stock_item_table,
    student::create_student_table,
};

/// Create the application's tables if they do not already exist.
///
/// All tables are created within a single exclusive transaction so that a
/// half-initialized schema is never left behind.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_student_table(&transaction)?;
    create_stock_item_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_purchase_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
