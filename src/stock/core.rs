//! Defines the stock item model and the database queries for managing the
//! tuck shop's catalog.
//!
//! Prices and names may be edited freely through the CRUD functions, but the
//! on-hand quantity is only ever reduced through [reserve_and_decrement],
//! which the ledger's purchase operation calls inside its own SQL
//! transaction.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Alias for the integer type used for stock item IDs.
pub type StockItemId = i64;

/// An item for sale in the tuck shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    /// The ID of the stock item.
    pub id: StockItemId,
    /// The display name of the item.
    pub item_name: String,
    /// The number of units on hand. Never negative.
    pub quantity: i64,
    /// What the shop paid per unit.
    pub cost_price: f64,
    /// What a student pays per unit.
    pub selling_price: f64,
    /// When the item was created or last edited.
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// The fields for creating or editing a stock item.
#[derive(Debug, Clone, Deserialize)]
pub struct StockItemForm {
    /// The display name of the item.
    pub item_name: String,
    /// The number of units on hand.
    pub quantity: i64,
    /// What the shop paid per unit.
    pub cost_price: f64,
    /// What a student pays per unit.
    pub selling_price: f64,
}

impl StockItemForm {
    fn validate(&self) -> Result<(), Error> {
        if self.item_name.trim().is_empty() {
            return Err(Error::EmptyName);
        }

        if self.quantity < 0 {
            return Err(Error::InvalidQuantity(self.quantity));
        }

        for price in [self.cost_price, self.selling_price] {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::InvalidPrice(price));
            }
        }

        Ok(())
    }
}

pub fn create_stock_item_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS stock_item (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            cost_price REAL NOT NULL,
            selling_price REAL NOT NULL,
            last_updated TEXT NOT NULL,
            CHECK (quantity >= 0)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_stock_item(row: &rusqlite::Row) -> Result<StockItem, rusqlite::Error> {
    Ok(StockItem {
        id: row.get(0)?,
        item_name: row.get(1)?,
        quantity: row.get(2)?,
        cost_price: row.get(3)?,
        selling_price: row.get(4)?,
        last_updated: row.get(5)?,
    })
}

const STOCK_COLUMNS: &str = "id, item_name, quantity, cost_price, selling_price, last_updated";

/// Add a new item to the catalog.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if the item name is empty or whitespace,
/// - or [Error::InvalidQuantity] if the quantity is negative,
/// - or [Error::InvalidPrice] if either price is negative or not finite,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_stock_item(form: &StockItemForm, connection: &Connection) -> Result<StockItem, Error> {
    form.validate()?;

    let item = connection
        .prepare(&format!(
            "INSERT INTO stock_item (item_name, quantity, cost_price, selling_price, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {STOCK_COLUMNS}"
        ))?
        .query_row(
            (
                form.item_name.trim(),
                form.quantity,
                form.cost_price,
                form.selling_price,
                OffsetDateTime::now_utc(),
            ),
            map_row_to_stock_item,
        )?;

    Ok(item)
}

/// Replace the name, quantity and prices of an existing item.
///
/// Editing prices never changes already-recorded purchases: purchases keep
/// the prices snapshotted when they were committed.
///
/// # Errors
/// This function will return a:
/// - [Error::ItemNotFound] if `id` does not refer to an item in the catalog,
/// - or the same validation errors as [create_stock_item],
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_stock_item(
    id: StockItemId,
    form: &StockItemForm,
    connection: &Connection,
) -> Result<StockItem, Error> {
    form.validate()?;

    connection
        .prepare(&format!(
            "UPDATE stock_item
             SET item_name = ?1, quantity = ?2, cost_price = ?3, selling_price = ?4,
                 last_updated = ?5
             WHERE id = ?6
             RETURNING {STOCK_COLUMNS}"
        ))?
        .query_row(
            (
                form.item_name.trim(),
                form.quantity,
                form.cost_price,
                form.selling_price,
                OffsetDateTime::now_utc(),
                id,
            ),
            map_row_to_stock_item,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ItemNotFound,
            error => error.into(),
        })
}

/// Remove an item from the catalog.
///
/// Purchases that reference the item keep their snapshotted prices and are
/// not affected.
///
/// # Errors
/// This function will return a:
/// - [Error::ItemNotFound] if `id` does not refer to an item in the catalog,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_stock_item(id: StockItemId, connection: &Connection) -> Result<(), Error> {
    let deleted = connection.execute("DELETE FROM stock_item WHERE id = ?1", (id,))?;

    if deleted == 0 {
        return Err(Error::ItemNotFound);
    }

    Ok(())
}

/// Retrieve a stock item by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ItemNotFound] if `id` does not refer to an item in the catalog,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_stock_item(id: StockItemId, connection: &Connection) -> Result<StockItem, Error> {
    connection
        .prepare(&format!("SELECT {STOCK_COLUMNS} FROM stock_item WHERE id = :id"))?
        .query_one(&[(":id", &id)], map_row_to_stock_item)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ItemNotFound,
            error => error.into(),
        })
}

/// Retrieve the whole catalog, ordered by item name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_stock_items(connection: &Connection) -> Result<Vec<StockItem>, Error> {
    let mut stmt =
        connection.prepare(&format!("SELECT {STOCK_COLUMNS} FROM stock_item ORDER BY item_name"))?;

    let items = stmt
        .query_map([], map_row_to_stock_item)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Atomically take `quantity` units of an item out of stock.
///
/// The check and the decrement are a single conditional `UPDATE`, so two
/// purchases racing for the last units cannot both succeed: whichever commits
/// second sees the already-decremented quantity and fails.
///
/// This is a ledger primitive: callers are expected to run it inside the same
/// SQL transaction as the purchase record insert, so a later failure rolls
/// the decrement back.
///
/// # Errors
/// This function will return a:
/// - [Error::ItemNotFound] if `id` does not refer to an item in the catalog,
/// - or [Error::InsufficientStock] if fewer than `quantity` units are on hand,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn reserve_and_decrement(
    id: StockItemId,
    quantity: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let changed = connection.execute(
        "UPDATE stock_item SET quantity = quantity - ?1 WHERE id = ?2 AND quantity >= ?1",
        (quantity, id),
    )?;

    if changed == 0 {
        // Distinguish a missing item from one with too few units on hand.
        let available: i64 = connection
            .query_row("SELECT quantity FROM stock_item WHERE id = ?1", (id,), |row| {
                row.get(0)
            })
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::ItemNotFound,
                error => Error::from(error),
            })?;

        return Err(Error::InsufficientStock {
            requested: quantity,
            available,
        });
    }

    Ok(())
}

/// The value of the catalog at cost price, `SUM(quantity * cost_price)`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn total_stock_value(connection: &Connection) -> Result<f64, Error> {
    let total = connection.query_row(
        "SELECT COALESCE(SUM(quantity * cost_price), 0) FROM stock_item",
        [],
        |row| row.get(0),
    )?;

    Ok(total)
}
