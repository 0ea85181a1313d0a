use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::non_blank;
use crate::response::AppError;
use crate::services::prompt::{clamp_vocabulary_count, Level};
use crate::services::vocabulary_parser::VocabularyEntry;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VocabularyQuery {
    level: Option<String>,
    topic: Option<String>,
    count: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VocabularyResponse {
    vocabulary: Vec<VocabularyEntry>,
}

pub async fn generate(
    State(state): State<AppState>,
    Query(query): Query<VocabularyQuery>,
) -> Result<Json<VocabularyResponse>, AppError> {
    let Some(coach) = state.coach() else {
        return Err(AppError::assistant_unavailable());
    };

    let level = Level::from_param(query.level.as_deref());
    let count = clamp_vocabulary_count(
        non_blank(query.count.as_deref()).and_then(|c| c.trim().parse::<usize>().ok()),
    );
    let vocabulary = coach
        .vocabulary(level, non_blank(query.topic.as_deref()), count)
        .await?;

    Ok(Json(VocabularyResponse { vocabulary }))
}
