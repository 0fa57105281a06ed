//! Defines the endpoint for listing the stock catalog.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, stock::StockItem};

use super::core::list_stock_items;

/// The state needed to list the catalog.
#[derive(Debug, Clone)]
pub struct ListStockState {
    /// The database connection for reading stock.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListStockState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the whole catalog, ordered by item name.
pub async fn list_stock_endpoint(
    State(state): State<ListStockState>,
) -> Result<Json<Vec<StockItem>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let items = list_stock_items(&connection)?;

    Ok(Json(items))
}
