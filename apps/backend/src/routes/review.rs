//! Review queue endpoint

use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use learntocode_core::due_concepts;

use crate::error::Result;
use crate::models::{DueConceptInfo, DueConceptsResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/review/due
/// Concepts due for review, most urgent first
pub async fn due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<DueConceptsResponse>> {
    let mastery: HashMap<_, _> = state
        .db
        .get_concept_mastery(auth.user_id)
        .await?
        .into_iter()
        .map(|row| (row.concept.clone(), row.to_core()))
        .collect();

    let concepts = due_concepts(&mastery, Utc::now())
        .into_iter()
        .map(|due| DueConceptInfo {
            concept: due.mastery.concept.clone(),
            interval_days: due.mastery.interval_days,
            repetition: due.mastery.repetition,
            ease_factor: due.mastery.ease_factor,
            next_review_at: due.mastery.next_review_at,
            incorrect_count: due.mastery.incorrect_count,
            priority: due.priority,
        })
        .collect();

    Ok(Json(DueConceptsResponse { concepts }))
}
