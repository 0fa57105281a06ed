//! Defines the endpoint for the admin dashboard figures.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error};

use super::stats::{DashboardStats, get_dashboard_stats};

/// The state needed to compute the dashboard figures.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the ledger and catalog.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the admin dashboard's headline figures.
pub async fn dashboard_endpoint(
    State(state): State<DashboardState>,
) -> Result<Json<DashboardStats>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let stats = get_dashboard_stats(&connection)?;

    Ok(Json(stats))
}
