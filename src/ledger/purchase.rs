//! Defines the purchase ledger record and the stock purchase operation.
//!
//! A purchase touches three tables at once: it decrements the stock item's
//! on-hand quantity, debits the student's wallet and appends the purchase
//! record. [apply_purchase] commits all three effects as one SQL transaction
//! with the selling and cost prices snapshotted at commit time, so later
//! price edits never change recorded history.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    pagination::Page,
    stock::{self, StockItemId},
    student::{self, StudentId},
};

/// Whether purchases must be covered by the student's current balance.
///
/// The default mirrors the expense policy: overdrafts are permitted and stock
/// sufficiency is the only hard precondition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurchasePolicy {
    /// When set, a purchase whose total price exceeds the student's balance
    /// fails with [Error::InsufficientBalance] instead of overdrafting.
    pub require_sufficient_balance: bool,
}

/// A stock purchase charged against a student's wallet.
///
/// Purchases are append-only: once created they are never updated or
/// deleted. `unit_price`, `total_price` and `profit` are snapshots taken at
/// commit time, not live references into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// The ID of the purchase.
    pub id: DatabaseId,
    /// The student who was charged.
    pub student_id: StudentId,
    /// The stock item that was bought.
    pub item_id: StockItemId,
    /// The number of units bought. Always positive.
    pub quantity: i64,
    /// The selling price per unit when the purchase was committed.
    pub unit_price: f64,
    /// `unit_price * quantity`.
    pub total_price: f64,
    /// `(unit_price - cost_price_at_commit) * quantity`.
    pub profit: f64,
    /// When the purchase was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn create_purchase_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS purchase (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price REAL NOT NULL,
            total_price REAL NOT NULL,
            profit REAL NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(student_id) REFERENCES student(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_purchase_row(row: &rusqlite::Row) -> Result<Purchase, rusqlite::Error> {
    Ok(Purchase {
        id: row.get(0)?,
        student_id: row.get(1)?,
        item_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: row.get(4)?,
        total_price: row.get(5)?,
        profit: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const PURCHASE_COLUMNS: &str =
    "id, student_id, item_id, quantity, unit_price, total_price, profit, created_at";

/// Charge a student for `quantity` units of a stock item.
///
/// All effects commit as a single unit: the stock decrement, the wallet debit
/// and the purchase record insert either all happen or none do. The check
/// against the on-hand quantity and the decrement are one conditional
/// `UPDATE`, so two purchases racing for the last units cannot jointly
/// oversell: the loser observes the already-decremented quantity and fails
/// with [Error::InsufficientStock].
///
/// Under the default [PurchasePolicy] the student's balance is not checked
/// and may go negative, mirroring the expense policy.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidQuantity] if `quantity` is zero or negative,
/// - or [Error::ItemNotFound] if `item_id` does not refer to a stock item,
/// - or [Error::InsufficientStock] if fewer than `quantity` units are on
///   hand,
/// - or [Error::InsufficientBalance] if the policy requires balance
///   sufficiency and the wallet cannot cover the total price,
/// - or [Error::StudentNotFound] if `student_id` does not refer to a
///   registered student,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// On any error no change is committed.
pub fn apply_purchase(
    student_id: StudentId,
    item_id: StockItemId,
    quantity: i64,
    policy: PurchasePolicy,
    connection: &Connection,
) -> Result<Purchase, Error> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity(quantity));
    }

    let tx = connection.unchecked_transaction()?;

    // Snapshot the prices before the decrement; both reads and all writes
    // happen inside the same SQL transaction.
    let item = stock::get_stock_item(item_id, &tx)?;
    stock::reserve_and_decrement(item_id, quantity, &tx)?;

    let unit_price = item.selling_price;
    let total_price = unit_price * quantity as f64;
    let profit = (unit_price - item.cost_price) * quantity as f64;

    if policy.require_sufficient_balance {
        let buyer = student::get_student_by_id(student_id, &tx)?;
        if buyer.balance < total_price {
            return Err(Error::InsufficientBalance {
                balance: buyer.balance,
                required: total_price,
            });
        }
    }

    student::debit(student_id, total_price, &tx)?;

    let purchase = tx
        .prepare(&format!(
            "INSERT INTO purchase (student_id, item_id, quantity, unit_price, total_price,
                                   profit, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {PURCHASE_COLUMNS}"
        ))?
        .query_row(
            (
                student_id,
                item_id,
                quantity,
                unit_price,
                total_price,
                profit,
                OffsetDateTime::now_utc(),
            ),
            map_purchase_row,
        )?;

    tx.commit()?;

    Ok(purchase)
}

/// A purchase joined with its student and item, for listing views.
///
/// The item name is optional because catalog items may be deleted after the
/// purchase was recorded; the snapshotted prices on the purchase itself are
/// unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    /// The ledger record.
    #[serde(flatten)]
    pub purchase: Purchase,
    /// The student's name at the time of the query.
    pub student_name: Option<String>,
    /// The student's admission number at the time of the query.
    pub admission_no: Option<String>,
    /// The item's name at the time of the query.
    pub item_name: Option<String>,
}

fn map_purchase_record_row(row: &rusqlite::Row) -> Result<PurchaseRecord, rusqlite::Error> {
    Ok(PurchaseRecord {
        purchase: map_purchase_row(row)?,
        student_name: row.get(8)?,
        admission_no: row.get(9)?,
        item_name: row.get(10)?,
    })
}

/// Retrieve a page of purchases, newest first, with student and item details.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_recent_purchases(
    page: Page,
    connection: &Connection,
) -> Result<Vec<PurchaseRecord>, Error> {
    let mut stmt = connection.prepare(
        "SELECT p.id, p.student_id, p.item_id, p.quantity, p.unit_price, p.total_price,
                p.profit, p.created_at, s.name, s.admission_no, i.item_name
         FROM purchase p
         LEFT JOIN student s ON s.id = p.student_id
         LEFT JOIN stock_item i ON i.id = p.item_id
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?1 OFFSET ?2",
    )?;

    let purchases = stmt
        .query_map((page.size, page.offset()), map_purchase_record_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(purchases)
}

/// Get the total number of purchases in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_purchases(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM purchase", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// The lifetime sum of profit across all purchases, from snapshotted prices.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn total_profit(connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row("SELECT COALESCE(SUM(profit), 0) FROM purchase", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}
