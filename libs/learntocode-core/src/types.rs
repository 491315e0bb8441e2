//! Core types for curriculum content, submitted answers and per-user progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::QuestionError;

/// Question kind tag, as stored with curriculum content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    Mcq,
    FillInBlank,
    Parsons,
    /// Reserved for debugging exercises; no content uses it yet.
    Debug,
}

impl QuestionKind {
    /// Get the kind tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "MCQ",
            Self::FillInBlank => "FILL_IN_BLANK",
            Self::Parsons => "PARSONS",
            Self::Debug => "DEBUG",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MCQ" => Some(Self::Mcq),
            "FILL_IN_BLANK" => Some(Self::FillInBlank),
            "PARSONS" => Some(Self::Parsons),
            "DEBUG" => Some(Self::Debug),
            _ => None,
        }
    }
}

/// Lesson difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonLevel {
    Beginner,
    Intermediate,
    Advanced,
    Master,
}

impl Default for LessonLevel {
    fn default() -> Self {
        Self::Beginner
    }
}

impl LessonLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Master => "Master",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Beginner" => Some(Self::Beginner),
            "Intermediate" => Some(Self::Intermediate),
            "Advanced" => Some(Self::Advanced),
            "Master" => Some(Self::Master),
            _ => None,
        }
    }
}

/// Kind-specific content of a question, including its solution.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionBody {
    MultipleChoice {
        options: Vec<String>,
        solution_index: usize,
    },
    FillInBlank {
        template: String,
        solution: String,
    },
    BlockReorder {
        blocks: Vec<String>,
        solution_order: Vec<usize>,
    },
    /// Stored content whose kind has no validator in this build.
    /// Answers to it are always graded incorrect.
    Unsupported { kind: String },
}

/// Raw question fields as they come out of storage.
#[derive(Debug, Clone, Default)]
pub struct StoredQuestionFields {
    pub options: Vec<String>,
    pub solution_index: Option<i32>,
    pub code_template: Option<String>,
    pub solution_text: Option<String>,
    pub blocks: Vec<String>,
    pub solution_order: Vec<i32>,
}

impl QuestionBody {
    /// Build a typed body from a stored kind tag and its raw fields.
    ///
    /// Unknown kinds (and the reserved `DEBUG` kind) become
    /// [`QuestionBody::Unsupported`] rather than an error.
    pub fn from_stored(kind: &str, fields: StoredQuestionFields) -> Result<Self, QuestionError> {
        match QuestionKind::from_str(kind) {
            Some(QuestionKind::Mcq) => {
                let raw = fields.solution_index.ok_or(QuestionError::MissingField {
                    kind: QuestionKind::Mcq,
                    field: "solution_index",
                })?;
                if fields.options.is_empty() {
                    return Err(QuestionError::MissingField {
                        kind: QuestionKind::Mcq,
                        field: "options",
                    });
                }
                let solution_index = checked_index(raw, fields.options.len())?;
                Ok(Self::MultipleChoice {
                    options: fields.options,
                    solution_index,
                })
            }
            Some(QuestionKind::FillInBlank) => {
                let solution = fields.solution_text.ok_or(QuestionError::MissingField {
                    kind: QuestionKind::FillInBlank,
                    field: "solution_text",
                })?;
                Ok(Self::FillInBlank {
                    template: fields.code_template.unwrap_or_default(),
                    solution,
                })
            }
            Some(QuestionKind::Parsons) => {
                if fields.solution_order.is_empty() {
                    return Err(QuestionError::MissingField {
                        kind: QuestionKind::Parsons,
                        field: "solution_order",
                    });
                }
                let solution_order = fields
                    .solution_order
                    .iter()
                    .map(|&i| checked_index(i, fields.blocks.len()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::BlockReorder {
                    blocks: fields.blocks,
                    solution_order,
                })
            }
            Some(QuestionKind::Debug) | None => Ok(Self::Unsupported {
                kind: kind.to_string(),
            }),
        }
    }

    /// The kind tag for this body, if it is a known one.
    pub fn kind(&self) -> Option<QuestionKind> {
        match self {
            Self::MultipleChoice { .. } => Some(QuestionKind::Mcq),
            Self::FillInBlank { .. } => Some(QuestionKind::FillInBlank),
            Self::BlockReorder { .. } => Some(QuestionKind::Parsons),
            Self::Unsupported { kind } => QuestionKind::from_str(kind),
        }
    }

    /// Kind tag string, including unknown ones.
    pub fn kind_str(&self) -> &str {
        match self {
            Self::Unsupported { kind } => kind,
            other => other.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }
}

fn checked_index(raw: i32, len: usize) -> Result<usize, QuestionError> {
    usize::try_from(raw)
        .ok()
        .filter(|&i| i < len)
        .ok_or(QuestionError::SolutionOutOfRange { index: raw, len })
}

/// A curriculum question. Immutable once authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub prompt: String,
    pub concepts: Vec<String>,
    pub body: QuestionBody,
}

impl Question {
    pub fn kind(&self) -> Option<QuestionKind> {
        self.body.kind()
    }
}

/// Lesson metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: i32,
    pub level: LessonLevel,
    pub xp_reward: u32,
    /// Lesson body shown before its questions.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One block of lesson body: prose or a code listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { body: String },
    Code { body: String },
}

/// An answer as submitted by the client.
///
/// Multiple-choice answers arrive as an index (or a numeric string),
/// fill-in-blank answers as text, block-reorder answers as an index list.
/// Fractional numbers and `null` are accepted so they can be graded rather
/// than rejected; a missing answer never validates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Index(i64),
    Number(f64),
    Order(Vec<i64>),
    Text(String),
    #[default]
    Missing,
}

/// SM-2 recall quality on the 0-5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Blackout,
    Incorrect,
    IncorrectEasyRecall,
    CorrectDifficult,
    CorrectHesitant,
    Perfect,
}

impl Quality {
    /// Convert to numeric value (0-5).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Blackout => 0,
            Self::Incorrect => 1,
            Self::IncorrectEasyRecall => 2,
            Self::CorrectDifficult => 3,
            Self::CorrectHesitant => 4,
            Self::Perfect => 5,
        }
    }

    /// Create from numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Blackout),
            1 => Some(Self::Incorrect),
            2 => Some(Self::IncorrectEasyRecall),
            3 => Some(Self::CorrectDifficult),
            4 => Some(Self::CorrectHesitant),
            5 => Some(Self::Perfect),
            _ => None,
        }
    }

    /// Map a binary verdict onto the scale.
    /// Correct -> Perfect (5), incorrect -> Blackout (0)
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Perfect } else { Self::Blackout }
    }

    pub fn is_passing(self) -> bool {
        self.to_value() >= 3
    }
}

/// Per-user, per-concept spaced repetition state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMastery {
    pub concept: String,
    pub interval_days: u32,
    pub repetition: u32,
    pub ease_factor: f64,
    pub next_review_at: DateTime<Utc>,
    pub incorrect_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// Record of a user's first correct answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionHistoryEntry {
    pub question_id: Uuid,
    pub answered_at: DateTime<Utc>,
    pub correct: bool,
}

/// Everything about a user that a submission reads or mutates.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProgress {
    pub user_id: Uuid,
    pub xp: u64,
    pub streak_count: u32,
    pub last_active_at: DateTime<Utc>,
    pub concept_mastery: HashMap<String, ConceptMastery>,
    pub question_history: HashMap<Uuid, QuestionHistoryEntry>,
}

impl UserProgress {
    /// Fresh state for a user with no activity.
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            xp: 0,
            streak_count: 0,
            last_active_at: now,
            concept_mastery: HashMap::new(),
            question_history: HashMap::new(),
        }
    }

    pub fn has_answered(&self, question_id: Uuid) -> bool {
        self.question_history.contains_key(&question_id)
    }
}

/// Lesson progress status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonStatus {
    Locked,
    Unlocked,
    Completed,
}

impl Default for LessonStatus {
    fn default() -> Self {
        Self::Locked
    }
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::Unlocked => "UNLOCKED",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOCKED" => Some(Self::Locked),
            "UNLOCKED" => Some(Self::Unlocked),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Per-user, per-lesson progress record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: Uuid,
    pub status: LessonStatus,
    pub best_score: u32,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    pub fn new(lesson_id: Uuid, status: LessonStatus) -> Self {
        Self {
            lesson_id,
            status,
            best_score: 0,
            attempts: 0,
            last_attempt_at: None,
        }
    }
}
