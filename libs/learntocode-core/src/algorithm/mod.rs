//! Spaced repetition scheduling for concept mastery.

pub mod sm2;

use crate::types::{ConceptMastery, Quality};
use chrono::{DateTime, Utc};

/// Trait for spaced repetition algorithms.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Next state of a concept after an answer touching it. The returned
    /// record replaces the old one; `next_review_at` is always a valid date.
    fn schedule(&self, state: &ConceptMastery, quality: Quality, now: DateTime<Utc>) -> ConceptMastery;

    /// Initial state for a concept the user has not met yet.
    fn initial_state(&self, concept: &str, now: DateTime<Utc>) -> ConceptMastery;
}
