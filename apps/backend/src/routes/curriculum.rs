//! Curriculum endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use learntocode_core::effective_status;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/curriculum
/// Lessons in order with the caller's status for each
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<CurriculumResponse>> {
    let lessons = state.db.list_lessons().await?;
    let records: HashMap<_, _> = state
        .db
        .list_lesson_progress(auth.user_id)
        .await?
        .into_iter()
        .map(|row| (row.lesson_id, row.to_core()))
        .collect();

    let lessons = lessons
        .into_iter()
        .map(|row| {
            let lesson = row.to_core_lesson();
            let record = records.get(&lesson.id);
            CurriculumLesson {
                status: effective_status(lesson.order, record),
                best_score: record.map(|r| r.best_score).unwrap_or(0),
                lesson,
            }
        })
        .collect();

    Ok(Json(CurriculumResponse { lessons }))
}

/// GET /api/curriculum/:slug
/// A lesson with its questions, solutions stripped
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LessonDetailResponse>> {
    let lesson = state
        .db
        .get_lesson_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Lesson '{}' not found", slug)))?;

    let questions = state
        .db
        .questions_for_lesson(lesson.id)
        .await?
        .iter()
        .map(DbQuestion::to_public_question)
        .collect();

    Ok(Json(LessonDetailResponse {
        lesson: lesson.to_core_lesson(),
        questions,
    }))
}
