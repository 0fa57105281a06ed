//! Balance queries for the tuck shop.
//!
//! Read-only lookups over the student registry: one student by admission
//! number, or a whole class by class code with summed totals.

mod core;
mod lookup_endpoint;

pub use core::{ClassBalances, ClassSummary, get_balance_by_admission_number, get_class_balances};
pub use lookup_endpoint::{BalanceLookup, balance_lookup_endpoint};
