use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::non_blank;
use crate::response::AppError;
use crate::services::feedback_parser::FeedbackResult;
use crate::services::prompt::Level;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    text: Option<String>,
    level: Option<String>,
    context: Option<String>,
}

pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResult>, AppError> {
    let Some(coach) = state.coach() else {
        return Err(AppError::assistant_unavailable());
    };

    let Json(body) = payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let text = non_blank(body.text.as_deref())
        .ok_or_else(|| AppError::validation("Input 'text' is required and cannot be empty."))?;

    let level = Level::from_param(body.level.as_deref());
    let result = coach
        .feedback(text, level, non_blank(body.context.as_deref()))
        .await?;

    Ok(Json(result))
}
