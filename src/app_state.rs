//! Implements a struct that holds the state of the REST server.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::Connection;

use crate::{
    Error, db::initialize, ledger::PurchasePolicy, pagination::PaginationConfig,
    student::ClassCodes,
};

/// How long a storage operation may wait on a locked database before it
/// reports [Error::DatabaseBusy](crate::Error::DatabaseBusy).
const DB_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The closed set of class codes this deployment accepts.
    pub class_codes: ClassCodes,

    /// Whether purchases must be covered by the student's balance.
    pub purchase_policy: PurchasePolicy,

    /// The config that controls how listing endpoints page their data.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        class_codes: ClassCodes,
        purchase_policy: PurchasePolicy,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        db_connection.busy_timeout(DB_BUSY_TIMEOUT)?;
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            class_codes,
            purchase_policy,
            pagination_config,
        })
    }
}
