//! Defines the endpoint for registering a new student.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, student::Student};

use super::core::{ClassCodes, register_student};

/// The state needed to register a student.
#[derive(Debug, Clone)]
pub struct RegisterStudentState {
    /// The database connection for managing students.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The class codes this deployment accepts.
    pub class_codes: ClassCodes,
}

impl FromRef<AppState> for RegisterStudentState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            class_codes: state.class_codes.clone(),
        }
    }
}

/// The request body for registering a student.
#[derive(Debug, Deserialize)]
pub struct RegisterStudentForm {
    /// The student's full name.
    pub name: String,
    /// The admission number, unique across the school.
    pub admission_no: String,
    /// The class the student belongs to, e.g. "S1".
    pub class_code: String,
}

/// A route handler for registering a new student.
///
/// The new student starts with a zeroed wallet; deposits are recorded
/// separately through the transactions endpoint.
pub async fn register_student_endpoint(
    State(state): State<RegisterStudentState>,
    Json(form): Json<RegisterStudentForm>,
) -> Result<(StatusCode, Json<Student>), Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let student = register_student(
        &form.name,
        &form.admission_no,
        &form.class_code,
        &state.class_codes,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(student)))
}
