//! Student registry for the tuck shop.
//!
//! This module contains everything related to students:
//! - The `Student` model and the registration operation
//! - Database functions for looking students up by ID, admission number or
//!   class code
//! - The crate-private wallet primitives used by the ledger
//! - Route handlers for registering and listing students

pub(crate) mod core;
mod list_endpoint;
mod register_endpoint;

pub use core::{
    ClassCodes, Student, StudentId, get_student_by_admission_number, get_student_by_id,
    get_students_by_class_code, list_students, register_student,
};
pub(crate) use core::{count_students, create_student_table, credit, debit};
pub use list_endpoint::list_students_endpoint;
pub use register_endpoint::register_student_endpoint;
