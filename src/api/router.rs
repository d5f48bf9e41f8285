use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, add_book, borrow_book, delete_book, get_book, get_loan, list_all_history,
    list_books, list_user_history, return_book, update_book,
};

/// Creates the API router
///
/// Catalog:
/// - GET /api/v1/books, GET /api/v1/books/:id (public)
/// - POST /api/v1/books, PUT|DELETE /api/v1/books/:id (admin)
///
/// Rental (authenticated):
/// - POST /api/v1/rent/book - Borrow a copy
/// - POST /api/v1/rent/return - Return a loan
/// - GET /api/v1/rent/history - All loan records (admin)
/// - GET /api/v1/rent/user-history - Caller's loan records
/// - GET /api/v1/rent/loans/:id - One loan record
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/books", get(list_books).post(add_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/rent/book", post(borrow_book))
        .route("/rent/return", post(return_book))
        .route("/rent/history", get(list_all_history))
        .route("/rent/user-history", get(list_user_history))
        .route("/rent/loans/:id", get(get_loan));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
