//! Defines the endpoint for browsing the purchase ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    pagination::{Page, PaginationConfig},
};

use super::{
    purchase::{PurchaseRecord, count_purchases, list_recent_purchases},
    transactions_endpoint::PageParams,
};

/// The state needed to browse purchases.
#[derive(Debug, Clone)]
pub struct ListPurchasesState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls paging.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListPurchasesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A page of purchases with paging metadata.
#[derive(Debug, Serialize)]
pub struct PurchasesPage {
    /// The purchases on this page, newest first.
    pub purchases: Vec<PurchaseRecord>,
    /// The 1-based page number.
    pub page: u64,
    /// The number of rows per page.
    pub per_page: u64,
    /// The total number of purchases in the ledger.
    pub total: u64,
}

/// A route handler that returns a page of purchases, newest first, with the
/// student and item each one refers to.
pub async fn list_purchases_endpoint(
    State(state): State<ListPurchasesState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PurchasesPage>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let page = Page::resolve(params.page, params.per_page, &state.pagination_config);
    let purchases = list_recent_purchases(page, &connection)?;
    let total = count_purchases(&connection)?;

    Ok(Json(PurchasesPage {
        purchases,
        page: page.number,
        per_page: page.size,
        total,
    }))
}
