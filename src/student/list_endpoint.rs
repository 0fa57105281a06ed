//! Defines the endpoint for listing the student roster.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{AppState, Error, student::Student};

use super::core::list_students;

/// The state needed to list students.
#[derive(Debug, Clone)]
pub struct ListStudentsState {
    /// The database connection for reading students.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListStudentsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns every registered student, ordered by name.
pub async fn list_students_endpoint(
    State(state): State<ListStudentsState>,
) -> Result<Json<Vec<Student>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLock
    })?;

    let students = list_students(&connection)?;

    Ok(Json(students))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        student::{ClassCodes, core::register_student},
    };

    use super::{ListStudentsState, list_students_endpoint};

    #[tokio::test]
    async fn lists_students_ordered_by_name() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let codes = ClassCodes::default();
        register_student("Charu Menon", "S1003", "S1", &codes, &connection).unwrap();
        register_student("Asha Rao", "S1001", "S1", &codes, &connection).unwrap();

        let state = ListStudentsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::STUDENTS, get(list_students_endpoint))
            .with_state(state);
        let server = TestServer::try_new(app).unwrap();

        let response = server.get(endpoints::STUDENTS).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body[0]["name"], "Asha Rao");
        assert_eq!(body[1]["name"], "Charu Menon");
    }
}
