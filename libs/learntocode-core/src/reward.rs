//! XP reward calculation and daily streak rules.
//!
//! `total = round(base × streak × difficulty × first_time)` where
//!
//! - base depends on the question kind,
//! - streak is `1 + 0.05 per streak day`, capped at 2.0,
//! - difficulty depends on the lesson level,
//! - first_time is 1.5 for the first correct answer to a question, 0.75 after.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::types::{LessonLevel, QuestionKind};

/// XP awarded when the computed total is not a usable number.
pub const FALLBACK_XP: u32 = 10;

pub const MAX_STREAK_MULTIPLIER: f64 = 2.0;
const STREAK_STEP: f64 = 0.05;
const FIRST_TIME_MULTIPLIER: f64 = 1.5;
const REPEAT_MULTIPLIER: f64 = 0.75;

/// Base XP for a question kind.
pub fn base_xp(kind: QuestionKind) -> u32 {
    match kind {
        QuestionKind::Mcq => 10,
        QuestionKind::FillInBlank => 15,
        QuestionKind::Parsons => 25,
        QuestionKind::Debug => 30,
    }
}

/// Multiplier for the lesson's difficulty level.
pub fn difficulty_multiplier(level: LessonLevel) -> f64 {
    match level {
        LessonLevel::Beginner => 1.0,
        LessonLevel::Intermediate => 1.5,
        LessonLevel::Advanced => 2.0,
        LessonLevel::Master => 2.5,
    }
}

/// Multiplier for the user's current streak.
pub fn streak_multiplier(streak_count: u32) -> f64 {
    (1.0 + f64::from(streak_count) * STREAK_STEP).min(MAX_STREAK_MULTIPLIER)
}

pub fn first_time_multiplier(is_first_attempt: bool) -> f64 {
    if is_first_attempt {
        FIRST_TIME_MULTIPLIER
    } else {
        REPEAT_MULTIPLIER
    }
}

/// Inputs to a reward calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardInput {
    pub kind: QuestionKind,
    pub level: LessonLevel,
    pub streak_count: u32,
    pub is_first_attempt: bool,
}

/// Individual multipliers applied to the base XP.
///
/// Serialized as two-decimal strings (`"1.50"`), the way they are shown to
/// users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Multipliers {
    #[serde(serialize_with = "two_decimals")]
    pub streak: f64,
    #[serde(serialize_with = "two_decimals")]
    pub difficulty: f64,
    #[serde(serialize_with = "two_decimals")]
    pub first_time: f64,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

/// Outcome of a reward calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reward {
    pub base_xp: u32,
    pub multipliers: Multipliers,
    pub total_xp: u32,
}

impl Reward {
    /// Human-readable breakdown of how the total was reached.
    pub fn breakdown(&self) -> String {
        format!(
            "Base: {} × Streak: {:.2} × Difficulty: {:.2} × First: {:.2} = {} XP",
            self.base_xp,
            self.multipliers.streak,
            self.multipliers.difficulty,
            self.multipliers.first_time,
            self.total_xp
        )
    }
}

/// Compute the XP for a correct answer. Pure.
pub fn compute_reward(input: RewardInput) -> Reward {
    let base = base_xp(input.kind);
    let multipliers = Multipliers {
        streak: streak_multiplier(input.streak_count),
        difficulty: difficulty_multiplier(input.level),
        first_time: first_time_multiplier(input.is_first_attempt),
    };

    Reward {
        base_xp: base,
        multipliers,
        total_xp: total_xp(base, &multipliers),
    }
}

fn total_xp(base: u32, m: &Multipliers) -> u32 {
    let raw = f64::from(base) * m.streak * m.difficulty * m.first_time;
    if !raw.is_finite() || raw < 0.0 || raw > f64::from(u32::MAX) {
        return FALLBACK_XP;
    }
    raw.round() as u32
}

/// Whole days elapsed between two instants, floored.
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_milliseconds().div_euclid(86_400_000)
}

/// Streak after a correct answer at `now`.
///
/// Exactly one day since the last activity continues the streak, more than
/// one starts a new streak of 1, and same-day (or clock-skewed) activity
/// leaves it unchanged.
pub fn next_streak(streak_count: u32, last_active_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    match days_between(last_active_at, now) {
        1 => streak_count.saturating_add(1),
        d if d > 1 => 1,
        _ => streak_count,
    }
}
