//! Defines the read-only balance queries: individual lookup by admission
//! number and batch lookup by class code with an aggregate summary.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    student::{Student, get_student_by_admission_number, get_students_by_class_code},
};

/// The summed wallet fields across a set of students.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    /// `sum(balance)` across the class.
    pub balance: f64,
    /// `sum(total_paid)` across the class.
    pub total_paid: f64,
    /// `sum(total_spent)` across the class.
    pub total_spent: f64,
}

/// The result of a class-code balance lookup.
///
/// An empty class yields an empty list and a zero summary; that is a normal
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassBalances {
    /// The class code that was looked up.
    pub class_code: String,
    /// The students in the class, ordered by name.
    pub students: Vec<Student>,
    /// The summed wallet fields across `students`.
    pub summary: ClassSummary,
}

/// Look up a single student's balance by their exact admission number.
///
/// # Errors
/// This function will return a:
/// - [Error::StudentNotFound] if no student has `admission_no`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_balance_by_admission_number(
    admission_no: &str,
    connection: &Connection,
) -> Result<Student, Error> {
    get_student_by_admission_number(admission_no, connection)
}

/// Look up every student in a class, ordered by name, with summed totals.
///
/// The summary is computed from the same row set that is returned, so the
/// list and the totals always agree.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_class_balances(
    class_code: &str,
    connection: &Connection,
) -> Result<ClassBalances, Error> {
    let students = get_students_by_class_code(class_code, connection)?;

    let summary = students.iter().fold(
        ClassSummary {
            balance: 0.0,
            total_paid: 0.0,
            total_spent: 0.0,
        },
        |mut summary, student| {
            summary.balance += student.balance;
            summary.total_paid += student.total_paid;
            summary.total_spent += student.total_spent;
            summary
        },
    );

    Ok(ClassBalances {
        class_code: class_code.to_owned(),
        students,
        summary,
    })
}

#[cfg(test)]
mod get_balance_by_admission_number_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        student::{ClassCodes, register_student},
    };

    use super::get_balance_by_admission_number;

    #[test]
    fn finds_student_by_exact_admission_number() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        register_student("Asha Rao", "S1001", "S1", &ClassCodes::default(), &conn).unwrap();

        let student = get_balance_by_admission_number("S1001", &conn).unwrap();

        assert_eq!(student.name, "Asha Rao");
        assert_eq!(student.balance, 0.0);
    }

    #[test]
    fn unknown_admission_number_is_not_found_not_an_empty_success() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let result = get_balance_by_admission_number("ZZZ", &conn);

        assert_eq!(result, Err(Error::StudentNotFound));
    }
}

#[cfg(test)]
mod get_class_balances_tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        ledger::{PaymentMethod, Transaction, TransactionKind, apply_transaction},
        student::{ClassCodes, register_student},
    };

    use super::get_class_balances;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn sums_balances_across_the_class() {
        let conn = get_test_connection();
        let codes = ClassCodes::default();
        // Balances 10, -5 and 20: deposits and expenses so the lifetime
        // totals are non-trivial too.
        for (name, admission_no, deposit, expense) in [
            ("Asha Rao", "S1001", 10.0, 0.0),
            ("Benoy Das", "S1002", 5.0, 10.0),
            ("Charu Menon", "S1003", 20.0, 0.0),
        ] {
            let student = register_student(name, admission_no, "S1", &codes, &conn).unwrap();
            apply_transaction(
                Transaction::build(student.id, TransactionKind::Deposit, deposit, PaymentMethod::Cash),
                &conn,
            )
            .unwrap();
            if expense > 0.0 {
                apply_transaction(
                    Transaction::build(student.id, TransactionKind::Expense, expense, PaymentMethod::Cash),
                    &conn,
                )
                .unwrap();
            }
        }

        let result = get_class_balances("S1", &conn).unwrap();

        assert_eq!(result.students.len(), 3);
        let names: Vec<&str> = result.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Asha Rao", "Benoy Das", "Charu Menon"]);
        assert_eq!(result.summary.balance, 25.0);
        assert_eq!(result.summary.total_paid, 35.0);
        assert_eq!(result.summary.total_spent, 10.0);
    }

    #[test]
    fn empty_class_yields_empty_list_and_zero_summary() {
        let conn = get_test_connection();

        let result = get_class_balances("D3", &conn).unwrap();

        assert!(result.students.is_empty());
        assert_eq!(result.summary.balance, 0.0);
        assert_eq!(result.summary.total_paid, 0.0);
        assert_eq!(result.summary.total_spent, 0.0);
    }

    #[test]
    fn other_classes_are_excluded() {
        let conn = get_test_connection();
        let codes = ClassCodes::default();
        register_student("Asha Rao", "S1001", "S1", &codes, &conn).unwrap();
        register_student("Benoy Das", "D2001", "D1", &codes, &conn).unwrap();

        let result = get_class_balances("S1", &conn).unwrap();

        assert_eq!(result.students.len(), 1);
        assert_eq!(result.students[0].admission_no, "S1001");
    }
}
