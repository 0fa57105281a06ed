//! Defines the aggregate figures shown at the top of the admin dashboard.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    ledger::{sum_deposits, sum_expenses, total_profit},
    stock::total_stock_value,
    student::count_students,
};

/// The headline figures for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// The number of registered students.
    pub total_students: u32,
    /// The lifetime sum of all deposits.
    pub total_deposits: f64,
    /// The lifetime sum of all expenses (not including purchases).
    pub total_expenses: f64,
    /// The lifetime sum of purchase profit, from snapshotted prices.
    pub net_profit: f64,
    /// The value of the catalog at cost price.
    pub total_stock_value: f64,
}

/// Compute the dashboard figures.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_dashboard_stats(connection: &Connection) -> Result<DashboardStats, Error> {
    Ok(DashboardStats {
        total_students: count_students(connection)?,
        total_deposits: sum_deposits(connection)?,
        total_expenses: sum_expenses(connection)?,
        net_profit: total_profit(connection)?,
        total_stock_value: total_stock_value(connection)?,
    })
}
