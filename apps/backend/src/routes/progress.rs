//! Answer submission and lesson completion endpoints

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::error::Result;
use crate::models::{
    CompleteLessonRequest, CompleteLessonResponse, SubmissionOutcome, ValidateAnswerRequest,
};
use crate::routes::auth::AuthenticatedUser;
use crate::services::progress::ProgressService;
use crate::AppState;

/// POST /api/progress/validate
pub async fn validate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<ValidateAnswerRequest>,
) -> Result<Json<SubmissionOutcome>> {
    let service = ProgressService::new(state.db.as_ref());
    let outcome = service
        .submit_answer(auth.user_id, payload.question_id, &payload.answer, Utc::now())
        .await?;

    Ok(Json(outcome))
}

/// POST /api/progress/complete-lesson
pub async fn complete_lesson(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CompleteLessonRequest>,
) -> Result<Json<CompleteLessonResponse>> {
    let service = ProgressService::new(state.db.as_ref());
    let response = service
        .complete_lesson(auth.user_id, payload.lesson_id, payload.score, Utc::now())
        .await?;

    Ok(Json(response))
}
