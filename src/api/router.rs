use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, adjust_stock, create_loan, finish_loan, get_loan, get_stock, renew_loan,
};

/// Creates the API router
///
/// Lending endpoints:
/// - POST /loans - Run the lending saga, streaming loan snapshots
/// - GET /loans/:id - Get a loan
/// - POST /loans/:id/finish - Finish a loan and release its stock
/// - POST /loans/:id/renew - Renew a loan
///
/// Book service endpoints:
/// - GET /books/:id/stock - Read stock
/// - POST /books/:id/stock - Adjust stock by a delta
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/loans", post(create_loan))
        .route("/loans/:id", get(get_loan))
        .route("/loans/:id/finish", post(finish_loan))
        .route("/loans/:id/renew", post(renew_loan))
        .route("/books/:id/stock", get(get_stock).post(adjust_stock))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
