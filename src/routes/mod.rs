mod daily_task;
mod feedback;
mod health;
mod vocabulary;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::welcome))
        .nest("/health", health::router())
        .route("/api/v1/feedback", post(feedback::submit))
        .route("/api/v1/daily-task", get(daily_task::generate))
        .route("/api/v1/vocabulary-list", get(vocabulary::generate))
        .fallback(fallback_handler)
        .with_state(state)
}

/// Treats a blank query/body value the same as an absent one. Non-blank
/// values are returned untouched.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

async fn fallback_handler() -> Response {
    AppError::not_found("Not Found").into_response()
}
