//! Core learning engine shared by the LearnToCode services.
//!
//! Provides:
//! - Tokenizer for code-like answers
//! - Answer validation per question kind
//! - SM-2 spaced repetition per concept
//! - XP reward and streak rules
//! - Pure submission grading and lesson unlock state machine
//! - Review queue and leaderboard helpers

pub mod algorithm;
pub mod error;
pub mod leaderboard;
pub mod progress;
pub mod review;
pub mod reward;
pub mod tokenizer;
pub mod types;
pub mod validator;

pub use algorithm::{sm2::Sm2, SpacedRepetitionAlgorithm};
pub use error::{QuestionError, Result};
pub use leaderboard::{percentile_label, RankTitle};
pub use progress::{
    complete_lesson, default_status, effective_status, grade_submission, unlock_next,
    GradedSubmission, SubmissionOutcome, MAX_LESSON_SCORE,
};
pub use review::{due_concepts, review_priority, DueConcept};
pub use reward::{compute_reward, next_streak, Multipliers, Reward, RewardInput};
pub use tokenizer::tokenize;
pub use types::{
    ConceptMastery, ContentBlock, Lesson, LessonLevel, LessonProgress, LessonStatus, Quality, Question,
    QuestionBody, QuestionHistoryEntry, QuestionKind, StoredQuestionFields, SubmittedAnswer,
    UserProgress,
};
pub use validator::validate;
