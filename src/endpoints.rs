//! The API endpoint URIs.

/// The route to register a student or list the roster.
pub const STUDENTS: &str = "/api/students";
/// The route for a student's recent transactions.
pub const STUDENT_TRANSACTIONS: &str = "/api/students/{student_id}/transactions";
/// The route to record or list wallet transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to record or list stock purchases.
pub const PURCHASES: &str = "/api/purchases";
/// The route to create or list stock items.
pub const STOCK: &str = "/api/stock";
/// The route to update or delete a stock item.
pub const STOCK_ITEM: &str = "/api/stock/{item_id}";
/// The route to look up a balance by admission number or class code.
pub const BALANCE_LOOKUP: &str = "/api/balances/{query}";
/// The route for the admin dashboard figures.
pub const DASHBOARD: &str = "/api/dashboard";
/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
