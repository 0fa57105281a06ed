//! Defines the endpoint for removing a stock item from the catalog.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{AppState, Error};

use super::core::{StockItemId, delete_stock_item};

/// The state needed to delete a stock item.
#[derive(Debug, Clone)]
pub struct DeleteStockItemState {
    /// The database connection for managing stock.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteStockItemState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for removing an item from the catalog.
///
/// Purchases that reference the item keep their snapshotted prices.
pub async fn delete_stock_item_endpoint(
    State(state): State<DeleteStockItemState>,
    Path(item_id): Path<StockItemId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    delete_stock_item(item_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
