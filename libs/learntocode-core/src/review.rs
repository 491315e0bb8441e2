//! Review queue: which concepts are due, and in what order.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::ConceptMastery;

/// Days of recency bonus a freshly reviewed concept gets.
const RECENCY_WINDOW_DAYS: f64 = 7.0;

/// Priority of a concept for review. Repeated failures weigh double, and
/// concepts reviewed within the last week get a bonus that fades linearly.
pub fn review_priority(
    incorrect_count: u32,
    last_reviewed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let recency = last_reviewed_at
        .map(|at| {
            let days_since = (now - at).num_milliseconds() as f64 / 86_400_000.0;
            (RECENCY_WINDOW_DAYS - days_since).max(0.0)
        })
        .unwrap_or(0.0);
    f64::from(incorrect_count) * 2.0 + recency
}

/// A concept that is due, with its computed priority.
#[derive(Debug, Clone, PartialEq)]
pub struct DueConcept<'a> {
    pub mastery: &'a ConceptMastery,
    pub priority: f64,
}

/// Concepts whose next review time has passed, highest priority first.
/// Ties are broken by concept name.
pub fn due_concepts(
    mastery: &HashMap<String, ConceptMastery>,
    now: DateTime<Utc>,
) -> Vec<DueConcept<'_>> {
    let mut due: Vec<_> = mastery
        .values()
        .filter(|m| m.next_review_at <= now)
        .map(|m| DueConcept {
            mastery: m,
            priority: review_priority(m.incorrect_count, m.last_reviewed_at, now),
        })
        .collect();

    due.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.mastery.concept.cmp(&b.mastery.concept))
    });
    due
}
