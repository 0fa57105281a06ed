//! Stock catalog for the tuck shop.
//!
//! This module contains everything related to stock:
//! - The `StockItem` model and CRUD database functions
//! - The atomic check-and-decrement primitive used by the ledger's purchase
//!   operation
//! - Route handlers for managing the catalog

pub(crate) mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;

pub use core::{
    StockItem, StockItemForm, StockItemId, create_stock_item, delete_stock_item, get_stock_item,
    list_stock_items, update_stock_item,
};
pub(crate) use core::{create_stock_item_table, reserve_and_decrement, total_stock_value};
pub use create_endpoint::create_stock_item_endpoint;
pub use delete_endpoint::delete_stock_item_endpoint;
pub use edit_endpoint::edit_stock_item_endpoint;
pub use list_endpoint::list_stock_endpoint;
