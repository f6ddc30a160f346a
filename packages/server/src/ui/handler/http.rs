//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::http::QuizDetailDto, ui::state::AppState, usecase::GetQuizDetailError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get quiz detail (with its attempts) by ID
pub async fn get_quiz_detail(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizDetailDto>, StatusCode> {
    match state.get_quiz_detail_usecase.execute(&quiz_id).await {
        // Domain Model から DTO への変換
        Ok((quiz, attempts)) => Ok(Json(QuizDetailDto::new(quiz, attempts))),
        Err(GetQuizDetailError::QuizNotFound) => Err(StatusCode::NOT_FOUND),
        Err(GetQuizDetailError::Repository(e)) => {
            tracing::error!("Failed to load quiz '{}': {}", quiz_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
