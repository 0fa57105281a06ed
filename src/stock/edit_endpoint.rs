//! Defines the endpoint for editing an existing stock item.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, stock::StockItem};

use super::core::{StockItemForm, StockItemId, update_stock_item};

/// The state needed to edit a stock item.
#[derive(Debug, Clone)]
pub struct EditStockItemState {
    /// The database connection for managing stock.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditStockItemState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for editing a catalog item's name, quantity and prices.
///
/// Already-recorded purchases keep their snapshotted prices.
pub async fn edit_stock_item_endpoint(
    State(state): State<EditStockItemState>,
    Path(item_id): Path<StockItemId>,
    Json(form): Json<StockItemForm>,
) -> Result<Json<StockItem>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let item = update_stock_item(item_id, &form, &connection)?;

    Ok(Json(item))
}
