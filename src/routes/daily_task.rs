use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::non_blank;
use crate::response::AppError;
use crate::services::prompt::Level;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DailyTaskQuery {
    level: Option<String>,
    context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyTaskResponse {
    task: String,
}

pub async fn generate(
    State(state): State<AppState>,
    Query(query): Query<DailyTaskQuery>,
) -> Result<Json<DailyTaskResponse>, AppError> {
    let Some(coach) = state.coach() else {
        return Err(AppError::assistant_unavailable());
    };

    let level = Level::from_param(query.level.as_deref());
    let task = coach
        .daily_task(level, non_blank(query.context.as_deref()))
        .await?;

    Ok(Json(DailyTaskResponse { task }))
}
