//! Per-submission grading and the lesson progress state machine.
//!
//! Everything here is pure: callers load state, hand it in, and persist the
//! returned state. Nothing is mutated in place.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::algorithm::SpacedRepetitionAlgorithm;
use crate::reward::{compute_reward, next_streak, Multipliers, RewardInput};
use crate::types::{
    LessonLevel, LessonProgress, LessonStatus, Quality, Question, QuestionHistoryEntry,
    QuestionKind, SubmittedAnswer, UserProgress,
};
use crate::validator::validate;

/// Lesson scores are percentages.
pub const MAX_LESSON_SCORE: u32 = 100;

/// What the user is told about a graded submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub is_correct: bool,
    pub xp_earned: u32,
    pub streak: u32,
    pub multipliers: Option<Multipliers>,
    pub is_first_attempt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<String>,
}

/// Graded submission: the user's new state plus the outcome.
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub user: UserProgress,
    pub outcome: SubmissionOutcome,
}

/// Grade one answer and compute the user's resulting state.
///
/// Every concept tagged on the question is rescheduled whether or not the
/// answer was correct. A concept tagged more than once is rescheduled once.
/// XP, streak and history only change on a correct answer.
pub fn grade_submission<A>(
    algorithm: &A,
    user: &UserProgress,
    question: &Question,
    level: LessonLevel,
    answer: &SubmittedAnswer,
    now: DateTime<Utc>,
) -> GradedSubmission
where
    A: SpacedRepetitionAlgorithm + ?Sized,
{
    let is_correct = validate(question, answer);
    let is_first_attempt = !user.has_answered(question.id);
    let mut next = user.clone();

    let quality = Quality::from_correct(is_correct);
    let mut seen = HashSet::new();
    for concept in question.concepts.iter().filter(|c| seen.insert(*c)) {
        let prior = user
            .concept_mastery
            .get(concept)
            .cloned()
            .unwrap_or_else(|| algorithm.initial_state(concept, now));
        next.concept_mastery
            .insert(concept.clone(), algorithm.schedule(&prior, quality, now));
    }

    if !is_correct {
        return GradedSubmission {
            outcome: SubmissionOutcome {
                is_correct,
                xp_earned: 0,
                streak: next.streak_count,
                multipliers: None,
                is_first_attempt,
                breakdown: None,
            },
            user: next,
        };
    }

    let reward = compute_reward(RewardInput {
        // Only known kinds can validate as correct; score anything else as MCQ.
        kind: question.kind().unwrap_or(QuestionKind::Mcq),
        level,
        streak_count: user.streak_count,
        is_first_attempt,
    });

    next.xp = next.xp.saturating_add(u64::from(reward.total_xp));
    next.streak_count = next_streak(user.streak_count, user.last_active_at, now);
    next.last_active_at = now;

    if is_first_attempt {
        next.question_history.insert(
            question.id,
            QuestionHistoryEntry {
                question_id: question.id,
                answered_at: now,
                correct: true,
            },
        );
    }

    GradedSubmission {
        outcome: SubmissionOutcome {
            is_correct,
            xp_earned: reward.total_xp,
            streak: next.streak_count,
            multipliers: Some(reward.multipliers),
            is_first_attempt,
            breakdown: Some(reward.breakdown()),
        },
        user: next,
    }
}

/// Status a lesson has for a user who has no progress record for it.
/// The first lesson is open, everything else starts locked.
pub fn default_status(order: i32) -> LessonStatus {
    if order == 0 {
        LessonStatus::Unlocked
    } else {
        LessonStatus::Locked
    }
}

/// Status shown for a lesson, from its record if there is one.
pub fn effective_status(order: i32, record: Option<&LessonProgress>) -> LessonStatus {
    record.map(|r| r.status).unwrap_or_else(|| default_status(order))
}

/// Mark a lesson completed with the given score.
pub fn complete_lesson(
    existing: Option<&LessonProgress>,
    lesson_id: Uuid,
    score: u32,
    now: DateTime<Utc>,
) -> LessonProgress {
    let prior = existing
        .cloned()
        .unwrap_or_else(|| LessonProgress::new(lesson_id, LessonStatus::Locked));

    LessonProgress {
        lesson_id,
        status: LessonStatus::Completed,
        best_score: prior.best_score.max(score),
        attempts: prior.attempts.saturating_add(1),
        last_attempt_at: Some(now),
    }
}

/// Progress record to create for the next lesson, if it has none yet.
///
/// An existing record is never replaced, so completing a lesson again cannot
/// reset or duplicate the following lesson's progress.
pub fn unlock_next(existing: Option<&LessonProgress>, next_lesson_id: Uuid) -> Option<LessonProgress> {
    match existing {
        Some(_) => None,
        None => Some(LessonProgress::new(next_lesson_id, LessonStatus::Unlocked)),
    }
}
