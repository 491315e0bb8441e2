//! Database models and API types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from learntocode-core
pub use learntocode_core::types::{
    ConceptMastery, ContentBlock, Lesson, LessonLevel, LessonProgress, LessonStatus, Question, QuestionBody,
    QuestionHistoryEntry, QuestionKind, StoredQuestionFields, SubmittedAnswer, UserProgress,
};
pub use learntocode_core::{QuestionError, RankTitle, SubmissionOutcome};

// === Database Entity Types ===

/// User account with gamification counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
    pub xp: i64,
    pub streak_count: i32,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Lesson stored in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLesson {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub lesson_order: i32,
    pub level: String,
    pub xp_reward: i32,
    pub content: Json<Vec<ContentBlock>>,
}

impl DbLesson {
    /// Convert to core lesson type. Unknown levels count as Beginner.
    pub fn to_core_lesson(&self) -> Lesson {
        Lesson {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            order: self.lesson_order,
            level: LessonLevel::from_str(&self.level).unwrap_or_default(),
            xp_reward: self.xp_reward.max(0) as u32,
            content: self.content.0.clone(),
        }
    }
}

/// Question stored in PostgreSQL, solution columns included
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestion {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub kind: String,
    pub prompt: String,
    pub code_template: Option<String>,
    pub options: Vec<String>,
    pub blocks: Vec<String>,
    pub solution_index: Option<i32>,
    pub solution_text: Option<String>,
    pub solution_order: Vec<i32>,
    pub concepts: Vec<String>,
}

impl DbQuestion {
    /// Convert to core question type
    pub fn to_core_question(&self) -> Result<Question, QuestionError> {
        let body = QuestionBody::from_stored(
            &self.kind,
            StoredQuestionFields {
                options: self.options.clone(),
                solution_index: self.solution_index,
                code_template: self.code_template.clone(),
                solution_text: self.solution_text.clone(),
                blocks: self.blocks.clone(),
                solution_order: self.solution_order.clone(),
            },
        )?;

        Ok(Question {
            id: self.id,
            lesson_id: self.lesson_id,
            prompt: self.prompt.clone(),
            concepts: self.concepts.clone(),
            body,
        })
    }

    /// Client-facing view with the solution removed
    pub fn to_public_question(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            kind: self.kind.clone(),
            prompt: self.prompt.clone(),
            code_template: self.code_template.clone(),
            options: self.options.clone(),
            blocks: self.blocks.clone(),
            concepts: self.concepts.clone(),
        }
    }
}

/// Concept mastery row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbConceptMastery {
    pub user_id: Uuid,
    pub concept: String,
    pub interval_days: i32,
    pub repetition: i32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
    pub incorrect_count: i32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl DbConceptMastery {
    /// Create from core ConceptMastery
    pub fn from_core(user_id: Uuid, mastery: &ConceptMastery) -> Self {
        Self {
            user_id,
            concept: mastery.concept.clone(),
            interval_days: saturating_i32(mastery.interval_days),
            repetition: saturating_i32(mastery.repetition),
            ease_factor: mastery.ease_factor,
            next_review_at: mastery.next_review_at,
            incorrect_count: saturating_i32(mastery.incorrect_count),
            last_reviewed_at: mastery.last_reviewed_at,
        }
    }

    /// Convert to core ConceptMastery
    pub fn to_core(&self) -> ConceptMastery {
        ConceptMastery {
            concept: self.concept.clone(),
            interval_days: self.interval_days.max(0) as u32,
            repetition: self.repetition.max(0) as u32,
            ease_factor: self.ease_factor,
            next_review_at: self.next_review_at,
            incorrect_count: self.incorrect_count.max(0) as u32,
            last_reviewed_at: self.last_reviewed_at,
        }
    }
}

/// Question history row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbQuestionHistory {
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub answered_at: DateTime<Utc>,
    pub correct: bool,
}

impl DbQuestionHistory {
    pub fn to_core(&self) -> QuestionHistoryEntry {
        QuestionHistoryEntry {
            question_id: self.question_id,
            answered_at: self.answered_at,
            correct: self.correct,
        }
    }
}

/// Lesson progress row in PostgreSQL
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbLessonProgress {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub status: String,
    pub best_score: i32,
    pub attempts: i32,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl DbLessonProgress {
    /// Create from core LessonProgress
    pub fn from_core(user_id: Uuid, progress: &LessonProgress) -> Self {
        Self {
            user_id,
            lesson_id: progress.lesson_id,
            status: progress.status.as_str().to_string(),
            best_score: saturating_i32(progress.best_score),
            attempts: saturating_i32(progress.attempts),
            last_attempt_at: progress.last_attempt_at,
        }
    }

    /// Convert to core LessonProgress
    pub fn to_core(&self) -> LessonProgress {
        LessonProgress {
            lesson_id: self.lesson_id,
            status: LessonStatus::from_str(&self.status).unwrap_or_default(),
            best_score: self.best_score.max(0) as u32,
            attempts: self.attempts.max(0) as u32,
            last_attempt_at: self.last_attempt_at,
        }
    }
}

/// Counters are `INTEGER` columns; values past `i32::MAX` are pinned there.
fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Leaderboard row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaderboardRow {
    pub id: Uuid,
    pub username: String,
    pub xp: i64,
    pub streak_count: i32,
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub user_id: Uuid,
    pub username: String,
    pub xp: i64,
    pub streak_count: i32,
    pub last_active_at: DateTime<Utc>,
    pub title: RankTitle,
}

// Progress types
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateAnswerRequest {
    pub question_id: Uuid,
    #[serde(default)]
    pub answer: SubmittedAnswer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteLessonRequest {
    pub lesson_id: Uuid,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteLessonResponse {
    pub progress: LessonProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_lesson_id: Option<Uuid>,
}

// Curriculum types
#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub status: LessonStatus,
    pub best_score: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurriculumResponse {
    pub lessons: Vec<CurriculumLesson>,
}

/// Question as shown to learners: no solution fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub kind: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_template: Option<String>,
    pub options: Vec<String>,
    pub blocks: Vec<String>,
    pub concepts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LessonDetailResponse {
    pub lesson: Lesson,
    pub questions: Vec<PublicQuestion>,
}

// Review types
#[derive(Debug, Serialize, Deserialize)]
pub struct DueConceptInfo {
    pub concept: String,
    pub interval_days: u32,
    pub repetition: u32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
    pub incorrect_count: u32,
    pub priority: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DueConceptsResponse {
    pub concepts: Vec<DueConceptInfo>,
}

// Leaderboard types
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub username: String,
    pub xp: i64,
    pub streak_count: i32,
    pub rank: u64,
    pub title: RankTitle,
    pub is_current_user: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserStanding {
    pub rank: u64,
    pub percentile: String,
    pub total_users: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub users: Vec<LeaderboardEntry>,
    pub user_stats: UserStanding,
}
