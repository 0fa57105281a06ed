//! Defines the endpoint for adding a new stock item.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{AppState, Error, stock::StockItem};

use super::core::{StockItemForm, create_stock_item};

/// The state needed to create a stock item.
#[derive(Debug, Clone)]
pub struct CreateStockItemState {
    /// The database connection for managing stock.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateStockItemState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for adding an item to the catalog.
pub async fn create_stock_item_endpoint(
    State(state): State<CreateStockItemState>,
    Json(form): Json<StockItemForm>,
) -> Result<(StatusCode, Json<StockItem>), Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let item = create_stock_item(&form, &connection)?;

    Ok((StatusCode::CREATED, Json(item)))
}
