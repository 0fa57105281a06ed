//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use crate::{
    AppState,
    balance::balance_lookup_endpoint,
    dashboard::dashboard_endpoint,
    endpoints,
    ledger::{
        create_purchase_endpoint, create_transaction_endpoint, list_purchases_endpoint,
        list_transactions_endpoint, student_transactions_endpoint,
    },
    logging::logging_middleware,
    stock::{
        create_stock_item_endpoint, delete_stock_item_endpoint, edit_stock_item_endpoint,
        list_stock_endpoint,
    },
    student::{list_students_endpoint, register_student_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(
            endpoints::STUDENTS,
            get(list_students_endpoint).post(register_student_endpoint),
        )
        .route(
            endpoints::STUDENT_TRANSACTIONS,
            get(student_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::PURCHASES,
            get(list_purchases_endpoint).post(create_purchase_endpoint),
        )
        .route(
            endpoints::STOCK,
            get(list_stock_endpoint).post(create_stock_item_endpoint),
        )
        .route(
            endpoints::STOCK_ITEM,
            put(edit_stock_item_endpoint).delete(delete_stock_item_endpoint),
        )
        .route(endpoints::BALANCE_LOOKUP, get(balance_lookup_endpoint))
        .route(endpoints::DASHBOARD, get(dashboard_endpoint))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Politely refuse to brew coffee.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}
