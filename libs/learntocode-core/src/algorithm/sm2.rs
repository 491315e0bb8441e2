//! SM-2 spaced repetition algorithm.
//!
//! Classic SuperMemo 2 scheduling on a 0-5 quality scale, with configurable
//! ease bounds and the two fixed opening intervals.

use super::SpacedRepetitionAlgorithm;
use crate::types::{ConceptMastery, Quality};
use chrono::{DateTime, Duration, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub initial_interval: u32,
    pub first_interval: u32,
    pub second_interval: u32,
    /// Upper bound on any interval, in days.
    pub maximum_interval: u32,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            initial_interval: 1,
            first_interval: 1,
            second_interval: 6,
            maximum_interval: 36_500,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn initial_state(&self, concept: &str, now: DateTime<Utc>) -> ConceptMastery {
        ConceptMastery {
            concept: concept.to_string(),
            interval_days: self.initial_interval,
            repetition: 0,
            ease_factor: self.initial_ease,
            next_review_at: now,
            incorrect_count: 0,
            last_reviewed_at: None,
        }
    }

    fn schedule(&self, state: &ConceptMastery, quality: Quality, now: DateTime<Utc>) -> ConceptMastery {
        let (interval, repetition, incorrect_count) = if quality.is_passing() {
            let interval = match state.repetition {
                0 => self.first_interval,
                1 => self.second_interval,
                _ => {
                    let grown = (f64::from(state.interval_days) * state.ease_factor).round();
                    grown.min(f64::from(self.maximum_interval)) as u32
                }
            };
            (
                interval.min(self.maximum_interval),
                state.repetition.saturating_add(1),
                state.incorrect_count,
            )
        } else {
            (
                self.first_interval.min(self.maximum_interval),
                0,
                state.incorrect_count.saturating_add(1),
            )
        };

        ConceptMastery {
            concept: state.concept.clone(),
            interval_days: interval,
            repetition,
            ease_factor: self.next_ease(state.ease_factor, quality),
            next_review_at: due_after(now, interval),
            incorrect_count,
            last_reviewed_at: Some(now),
        }
    }
}

/// `now` plus `days`, pinned to the latest representable instant on overflow.
fn due_after(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Sm2 {
    /// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at the minimum.
    pub fn next_ease(&self, ease: f64, quality: Quality) -> f64 {
        let miss = f64::from(5 - quality.to_value());
        (ease + (0.1 - miss * (0.08 + miss * 0.02))).max(self.minimum_ease)
    }
}
