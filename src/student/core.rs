//! Defines the student model, the registration operation and the database
//! queries for looking students up.
//!
//! The money fields on [Student] are owned by the ledger: the only code that
//! writes `balance`, `total_paid`, `total_spent` or `last_payment` is the
//! crate-private [credit] and [debit] primitives called from the ledger
//! operations.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Alias for the integer type used for student IDs.
pub type StudentId = i64;

/// A student with a prepaid wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// The ID of the student.
    pub id: StudentId,
    /// The admission number, unique across the school.
    pub admission_no: String,
    /// The class the student belongs to, e.g. "S1".
    pub class_code: String,
    /// The student's full name.
    pub name: String,
    /// The amount of money currently available to spend.
    ///
    /// May be negative: overdrafts are permitted.
    pub balance: f64,
    /// The lifetime sum of all deposits.
    pub total_paid: f64,
    /// The lifetime sum of all expenses and purchases.
    pub total_spent: f64,
    /// When the student last made a deposit.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_payment: Option<OffsetDateTime>,
    /// When the student was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The closed set of class codes a deployment accepts.
///
/// The set is configurable at startup but fixed for the lifetime of the
/// process, so an unknown class code can be told apart from a class that
/// simply has no students yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCodes(Vec<String>);

impl ClassCodes {
    /// Create a class code set from a comma-separated list, e.g. "S1,S2,D1,D3".
    ///
    /// Whitespace around each code is trimmed and empty entries are ignored.
    pub fn parse(codes: &str) -> Self {
        Self(
            codes
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Whether `code` is a member of the configured set.
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|known| known == code)
    }

    /// The configured codes, in configuration order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for ClassCodes {
    fn default() -> Self {
        Self::parse("S1,S2,D1,D3")
    }
}

pub fn create_student_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS student (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admission_no TEXT NOT NULL UNIQUE,
            class_code TEXT NOT NULL,
            name TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            total_paid REAL NOT NULL DEFAULT 0,
            total_spent REAL NOT NULL DEFAULT 0,
            last_payment TEXT,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_student(row: &rusqlite::Row) -> Result<Student, rusqlite::Error> {
    Ok(Student {
        id: row.get(0)?,
        admission_no: row.get(1)?,
        class_code: row.get(2)?,
        name: row.get(3)?,
        balance: row.get(4)?,
        total_paid: row.get(5)?,
        total_spent: row.get(6)?,
        last_payment: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const STUDENT_COLUMNS: &str =
    "id, admission_no, class_code, name, balance, total_paid, total_spent, last_payment, created_at";

/// Register a new student with a zeroed wallet.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyName] if `name` is empty or whitespace,
/// - or [Error::EmptyAdmissionNumber] if `admission_no` is empty or whitespace,
/// - or [Error::InvalidClassCode] if `class_code` is not in `class_codes`,
/// - or [Error::DuplicateAdmissionNumber] if a student with `admission_no`
///   already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn register_student(
    name: &str,
    admission_no: &str,
    class_code: &str,
    class_codes: &ClassCodes,
    connection: &Connection,
) -> Result<Student, Error> {
    let name = name.trim();
    let admission_no = admission_no.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    if admission_no.is_empty() {
        return Err(Error::EmptyAdmissionNumber);
    }

    if !class_codes.contains(class_code) {
        return Err(Error::InvalidClassCode(class_code.to_owned()));
    }

    let student = connection
        .prepare(&format!(
            "INSERT INTO student (admission_no, class_code, name, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {STUDENT_COLUMNS}"
        ))?
        .query_row(
            (
                admission_no,
                class_code,
                name,
                OffsetDateTime::now_utc(),
            ),
            map_row_to_student,
        )
        .map_err(|error| match error {
            // Handle unique admission number constraint violation
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAdmissionNumber(admission_no.to_owned())
            }
            error => error.into(),
        })?;

    Ok(student)
}

/// Retrieve a student from the database by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::StudentNotFound] if `id` does not refer to a registered student,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_student_by_id(id: StudentId, connection: &Connection) -> Result<Student, Error> {
    connection
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_row_to_student)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::StudentNotFound,
            error => error.into(),
        })
}

/// Retrieve a student from the database by their admission number.
///
/// The match is exact: no prefix or case-insensitive matching is performed.
///
/// # Errors
/// This function will return a:
/// - [Error::StudentNotFound] if no student has `admission_no`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_student_by_admission_number(
    admission_no: &str,
    connection: &Connection,
) -> Result<Student, Error> {
    connection
        .prepare(&format!(
            "SELECT {STUDENT_COLUMNS} FROM student WHERE admission_no = :admission_no"
        ))?
        .query_one(&[(":admission_no", &admission_no)], map_row_to_student)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::StudentNotFound,
            error => error.into(),
        })
}

/// Retrieve all students in a class, ordered by name.
///
/// An unknown class code and a class with no students both yield an empty
/// list; the caller is expected to validate the class code against the
/// configured [ClassCodes] if the distinction matters.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_students_by_class_code(
    class_code: &str,
    connection: &Connection,
) -> Result<Vec<Student>, Error> {
    let mut stmt = connection.prepare(&format!(
        "SELECT {STUDENT_COLUMNS} FROM student WHERE class_code = :class_code ORDER BY name"
    ))?;

    let students = stmt
        .query_map(&[(":class_code", &class_code)], map_row_to_student)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(students)
}

/// Retrieve all registered students, ordered by name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_students(connection: &Connection) -> Result<Vec<Student>, Error> {
    let mut stmt =
        connection.prepare(&format!("SELECT {STUDENT_COLUMNS} FROM student ORDER BY name"))?;

    let students = stmt
        .query_map([], map_row_to_student)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(students)
}

/// Get the total number of registered students.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_students(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM student", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Add `amount` to a student's wallet and lifetime deposits, and stamp the
/// deposit time.
///
/// This is a ledger primitive: callers are expected to run it inside the same
/// SQL transaction as the matching transaction record insert.
pub(crate) fn credit(
    student_id: StudentId,
    amount: f64,
    paid_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let changed = connection.execute(
        "UPDATE student
         SET balance = balance + ?1, total_paid = total_paid + ?1, last_payment = ?2
         WHERE id = ?3",
        (amount, paid_at, student_id),
    )?;

    if changed == 0 {
        return Err(Error::StudentNotFound);
    }

    Ok(())
}

/// Subtract `amount` from a student's wallet and add it to their lifetime
/// spending.
///
/// The balance is allowed to go negative. This is a ledger primitive: callers
/// are expected to run it inside the same SQL transaction as the matching
/// ledger record insert.
pub(crate) fn debit(
    student_id: StudentId,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let changed = connection.execute(
        "UPDATE student
         SET balance = balance - ?1, total_spent = total_spent + ?1
         WHERE id = ?2",
        (amount, student_id),
    )?;

    if changed == 0 {
        return Err(Error::StudentNotFound);
    }

    Ok(())
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_student_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_student_table(&connection));
    }
}




#[cfg(test)]
mod wallet_primitive_tests {
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::Error;

    use super::{
        ClassCodes, create_student_table, credit, debit, get_student_by_id, register_student,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_student_table(&conn).unwrap();
        conn
    }

    #[test]
    fn credit_updates_balance_totals_and_payment_time() {
        let conn = get_test_connection();
        let student =
            register_student("Asha Rao", "S1001", "S1", &ClassCodes::default(), &conn).unwrap();
        let paid_at = OffsetDateTime::now_utc();

        credit(student.id, 50.0, paid_at, &conn).unwrap();

        let got = get_student_by_id(student.id, &conn).unwrap();
        assert_eq!(got.balance, 50.0);
        assert_eq!(got.total_paid, 50.0);
        assert_eq!(got.total_spent, 0.0);
        assert!(got.last_payment.is_some());
    }

    #[test]
    fn debit_may_drive_balance_negative() {
        let conn = get_test_connection();
        let student =
            register_student("Asha Rao", "S1001", "S1", &ClassCodes::default(), &conn).unwrap();

        debit(student.id, 30.0, &conn).unwrap();

        let got = get_student_by_id(student.id, &conn).unwrap();
        assert_eq!(got.balance, -30.0);
        assert_eq!(got.total_spent, 30.0);
        assert_eq!(got.balance, got.total_paid - got.total_spent);
    }

    #[test]
    fn unknown_student_is_reported() {
        let conn = get_test_connection();

        assert_eq!(
            credit(99, 10.0, OffsetDateTime::now_utc(), &conn),
            Err(Error::StudentNotFound)
        );
        assert_eq!(debit(99, 10.0, &conn), Err(Error::StudentNotFound));
    }
}
