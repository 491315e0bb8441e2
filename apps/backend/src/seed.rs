//! Curriculum seeding.
//!
//! A course is authored as JSON: units of lessons, each lesson with its body
//! and questions. Seeding flattens the units into one global lesson order
//! starting at 0 and replaces whatever curriculum the database held.

use serde::Deserialize;
use sqlx::types::Json;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{ContentBlock, DbLesson, DbQuestion, LessonLevel, QuestionError, SubmittedAnswer};

/// The C++ course shipped with the backend.
const BUNDLED_COURSE: &str = include_str!("../data/cpp_course.json");

/// XP a seeded lesson is worth when the course does not say.
const DEFAULT_LESSON_XP: i32 = 50;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid course file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate lesson slug: {0}")]
    DuplicateSlug(String),

    #[error("Lesson {slug}: {source}")]
    Question {
        slug: String,
        #[source]
        source: QuestionError,
    },

    #[error("Lesson {slug}: solution {solution} does not fit a {kind} question")]
    SolutionShape {
        slug: String,
        kind: String,
        solution: String,
    },

    #[error("Course has more lessons than fit the lesson order")]
    TooManyLessons,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub title: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Unit {
    pub title: String,
    #[serde(default)]
    pub level: LessonLevel,
    pub lessons: Vec<SeedLesson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedLesson {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Falls back to the unit's level.
    #[serde(default)]
    pub level: Option<LessonLevel>,
    #[serde(default)]
    pub xp_reward: Option<i32>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub questions: Vec<SeedQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedQuestion {
    pub kind: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub code_template: Option<String>,
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Option index, expected text, or block order, depending on `kind`.
    pub solution: SubmittedAnswer,
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// Rows ready to insert, lessons in curriculum order.
#[derive(Debug, Clone, Default)]
pub struct CurriculumPlan {
    pub lessons: Vec<DbLesson>,
    pub questions: Vec<DbQuestion>,
}

impl Course {
    pub fn from_json(text: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The C++ course compiled into the binary.
    pub fn bundled() -> Result<Self, SeedError> {
        Self::from_json(BUNDLED_COURSE)
    }

    pub fn lesson_count(&self) -> usize {
        self.units.iter().map(|u| u.lessons.len()).sum()
    }
}

/// Flatten a course into rows.
///
/// Lessons are numbered 0, 1, 2, ... across units in authoring order. Every
/// question is checked the same way it will be read back, so a course that
/// plans cleanly loads cleanly.
pub fn plan(course: &Course) -> Result<CurriculumPlan, SeedError> {
    let mut plan = CurriculumPlan::default();
    let mut slugs = HashSet::new();

    for unit in &course.units {
        for lesson in &unit.lessons {
            if !slugs.insert(lesson.slug.as_str()) {
                return Err(SeedError::DuplicateSlug(lesson.slug.clone()));
            }
            let lesson_order =
                i32::try_from(plan.lessons.len()).map_err(|_| SeedError::TooManyLessons)?;

            let row = DbLesson {
                id: Uuid::new_v4(),
                slug: lesson.slug.clone(),
                title: lesson.title.clone(),
                description: lesson.description.clone(),
                lesson_order,
                level: lesson.level.unwrap_or(unit.level).as_str().to_string(),
                xp_reward: lesson.xp_reward.unwrap_or(DEFAULT_LESSON_XP),
                content: Json(lesson.content.clone()),
            };

            for question in &lesson.questions {
                let question_row = question_row(row.id, &lesson.slug, question)?;
                question_row
                    .to_core_question()
                    .map_err(|source| SeedError::Question {
                        slug: lesson.slug.clone(),
                        source,
                    })?;
                plan.questions.push(question_row);
            }

            plan.lessons.push(row);
        }
    }

    Ok(plan)
}

fn question_row(lesson_id: Uuid, slug: &str, question: &SeedQuestion) -> Result<DbQuestion, SeedError> {
    let shape_error = || SeedError::SolutionShape {
        slug: slug.to_string(),
        kind: question.kind.clone(),
        solution: format!("{:?}", question.solution),
    };

    let mut row = DbQuestion {
        id: Uuid::new_v4(),
        lesson_id,
        kind: question.kind.clone(),
        prompt: question.prompt.clone(),
        code_template: question.code_template.clone(),
        options: question.options.clone(),
        blocks: question.blocks.clone(),
        solution_index: None,
        solution_text: None,
        solution_order: Vec::new(),
        concepts: question.concepts.clone(),
    };

    match &question.solution {
        SubmittedAnswer::Index(index) => {
            row.solution_index = Some(i32::try_from(*index).map_err(|_| shape_error())?);
        }
        SubmittedAnswer::Text(text) => row.solution_text = Some(text.clone()),
        SubmittedAnswer::Order(order) => {
            row.solution_order = order
                .iter()
                .map(|&i| i32::try_from(i))
                .collect::<Result<_, _>>()
                .map_err(|_| shape_error())?;
        }
        SubmittedAnswer::Number(_) | SubmittedAnswer::Missing => return Err(shape_error()),
    }

    Ok(row)
}

/// Seed the database with `course`, replacing the current curriculum.
///
/// Removing a lesson removes its questions and any progress on them.
pub async fn seed(db: &Database, course: &Course) -> anyhow::Result<()> {
    let plan = plan(course)?;
    db.replace_curriculum(&plan).await?;

    tracing::info!(
        course = %course.title,
        lessons = plan.lessons.len(),
        questions = plan.questions.len(),
        "Seeded curriculum"
    );
    Ok(())
}
