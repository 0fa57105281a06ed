//! The ledger engine for the tuck shop.
//!
//! This module contains the two operations that move money:
//! - [apply_transaction] records a deposit or expense and updates the
//!   student's wallet in one atomic unit
//! - [apply_purchase] decrements stock, debits the wallet and appends the
//!   purchase record in one atomic unit, with prices snapshotted at commit
//!   time
//!
//! It also owns the ledger's read side: paged listings of transactions and
//! purchases, and the aggregate sums the dashboard reports.

mod create_purchase_endpoint;
mod create_transaction_endpoint;
mod purchase;
mod purchases_endpoint;
mod transaction;
mod transactions_endpoint;

pub use create_purchase_endpoint::create_purchase_endpoint;
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use purchase::{
    Purchase, PurchasePolicy, PurchaseRecord, apply_purchase, count_purchases,
    list_recent_purchases,
};
pub(crate) use purchase::{create_purchase_table, total_profit};
pub use purchases_endpoint::list_purchases_endpoint;
pub use transaction::{
    PaymentMethod, Transaction, TransactionBuilder, TransactionKind, TransactionRecord,
    apply_transaction, count_transactions, list_recent_transactions, list_transactions_for_student,
};
pub(crate) use transaction::{create_transaction_table, sum_deposits, sum_expenses};
pub use transactions_endpoint::{list_transactions_endpoint, student_transactions_endpoint};
