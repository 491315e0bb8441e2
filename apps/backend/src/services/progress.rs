//! Progress orchestration: answer submission and lesson completion.
//!
//! Each operation loads what it needs through [`ProgressStore`], runs the pure
//! core logic, and writes the result back once. Concurrent submissions for
//! the same user are not serialized here; the last save wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use learntocode_core::{complete_lesson, grade_submission, unlock_next, Sm2, MAX_LESSON_SCORE};

use crate::error::{ApiError, Result};
use crate::models::{
    CompleteLessonResponse, Lesson, LessonLevel, LessonProgress, Question, QuestionBody,
    SubmissionOutcome, SubmittedAnswer, UserProgress,
};

/// Persistence operations the orchestrator depends on.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>>;

    async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>>;

    async fn get_lesson_by_order(&self, order: i32) -> Result<Option<Lesson>>;

    async fn load_user_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>>;

    /// Persist the whole user state in one write.
    async fn save_user_progress(&self, user: &UserProgress) -> Result<()>;

    async fn get_lesson_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<LessonProgress>>;

    async fn save_lesson_progress(&self, user_id: Uuid, progress: &LessonProgress) -> Result<()>;

    /// Insert a record only if the user has none for that lesson.
    /// Returns whether a row was created.
    async fn insert_lesson_progress_if_absent(
        &self,
        user_id: Uuid,
        progress: &LessonProgress,
    ) -> Result<bool>;
}

/// Coordinates validation, scheduling and rewards for one user request.
pub struct ProgressService<'a, S: ?Sized> {
    store: &'a S,
    algorithm: Sm2,
}

impl<'a, S> ProgressService<'a, S>
where
    S: ProgressStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            algorithm: Sm2::default(),
        }
    }

    /// Grade an answer and apply its effects to the user's state.
    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        question_id: Uuid,
        answer: &SubmittedAnswer,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let question = self
            .store
            .get_question(question_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

        if let QuestionBody::Unsupported { kind } = &question.body {
            tracing::warn!(%question_id, %kind, "No validator for question kind, grading as incorrect");
        }

        let level = match self.store.get_lesson(question.lesson_id).await? {
            Some(lesson) => lesson.level,
            None => {
                tracing::warn!(%question_id, lesson_id = %question.lesson_id, "Question has no lesson, using default level");
                LessonLevel::default()
            }
        };

        let user = self
            .store
            .load_user_progress(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let graded = grade_submission(&self.algorithm, &user, &question, level, answer, now);
        self.store.save_user_progress(&graded.user).await?;

        tracing::info!(
            %user_id,
            %question_id,
            correct = graded.outcome.is_correct,
            xp = graded.outcome.xp_earned,
            streak = graded.outcome.streak,
            "Graded submission"
        );

        Ok(graded.outcome)
    }

    /// Mark a lesson completed and unlock the one after it.
    /// `score` is a percentage; anything above 100 is rejected.
    pub async fn complete_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        score: u32,
        now: DateTime<Utc>,
    ) -> Result<CompleteLessonResponse> {
        if score > MAX_LESSON_SCORE {
            return Err(ApiError::BadRequest(format!(
                "Score must be between 0 and {MAX_LESSON_SCORE}"
            )));
        }

        let lesson = self
            .store
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

        let existing = self.store.get_lesson_progress(user_id, lesson_id).await?;
        let progress = complete_lesson(existing.as_ref(), lesson_id, score, now);
        self.store.save_lesson_progress(user_id, &progress).await?;

        let mut unlocked_lesson_id = None;
        let next_lesson = match lesson.order.checked_add(1) {
            Some(order) => self.store.get_lesson_by_order(order).await?,
            None => None,
        };
        if let Some(next) = next_lesson {
            let next_existing = self.store.get_lesson_progress(user_id, next.id).await?;
            if let Some(record) = unlock_next(next_existing.as_ref(), next.id) {
                if self
                    .store
                    .insert_lesson_progress_if_absent(user_id, &record)
                    .await?
                {
                    tracing::info!(%user_id, lesson = %next.slug, "Unlocked lesson");
                    unlocked_lesson_id = Some(next.id);
                }
            }
        }

        tracing::info!(%user_id, lesson = %lesson.slug, score, attempts = progress.attempts, "Completed lesson");

        Ok(CompleteLessonResponse {
            progress,
            unlocked_lesson_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LessonStatus, QuestionKind};
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        questions: HashMap<Uuid, Question>,
        lessons: Vec<Lesson>,
        users: Mutex<HashMap<Uuid, UserProgress>>,
        lesson_progress: Mutex<HashMap<(Uuid, Uuid), LessonProgress>>,
        fail_saves: bool,
    }

    #[async_trait]
    impl ProgressStore for MemoryStore {
        async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>> {
            Ok(self.questions.get(&question_id).cloned())
        }

        async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>> {
            Ok(self.lessons.iter().find(|l| l.id == lesson_id).cloned())
        }

        async fn get_lesson_by_order(&self, order: i32) -> Result<Option<Lesson>> {
            Ok(self.lessons.iter().find(|l| l.order == order).cloned())
        }

        async fn load_user_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>> {
            Ok(self.users.lock().unwrap().get(&user_id).cloned())
        }

        async fn save_user_progress(&self, user: &UserProgress) -> Result<()> {
            if self.fail_saves {
                return Err(ApiError::Internal("store unavailable".to_string()));
            }
            self.users.lock().unwrap().insert(user.user_id, user.clone());
            Ok(())
        }

        async fn get_lesson_progress(
            &self,
            user_id: Uuid,
            lesson_id: Uuid,
        ) -> Result<Option<LessonProgress>> {
            Ok(self
                .lesson_progress
                .lock()
                .unwrap()
                .get(&(user_id, lesson_id))
                .cloned())
        }

        async fn save_lesson_progress(&self, user_id: Uuid, progress: &LessonProgress) -> Result<()> {
            self.lesson_progress
                .lock()
                .unwrap()
                .insert((user_id, progress.lesson_id), progress.clone());
            Ok(())
        }

        async fn insert_lesson_progress_if_absent(
            &self,
            user_id: Uuid,
            progress: &LessonProgress,
        ) -> Result<bool> {
            let mut map = self.lesson_progress.lock().unwrap();
            if map.contains_key(&(user_id, progress.lesson_id)) {
                return Ok(false);
            }
            map.insert((user_id, progress.lesson_id), progress.clone());
            Ok(true)
        }
    }

    fn lesson(order: i32, level: LessonLevel) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            slug: format!("lesson-{order}"),
            title: format!("Lesson {order}"),
            description: None,
            order,
            level,
            xp_reward: 50,
            content: Vec::new(),
        }
    }

    fn mcq(lesson_id: Uuid, concepts: &[&str]) -> Question {
        Question {
            id: Uuid::new_v4(),
            lesson_id,
            prompt: "What does return 0 signify?".to_string(),
            concepts: concepts.iter().map(|c| c.to_string()).collect(),
            body: QuestionBody::MultipleChoice {
                options: vec!["Restart".into(), "Success".into(), "Error".into()],
                solution_index: 1,
            },
        }
    }

    struct Fixture {
        store: MemoryStore,
        user_id: Uuid,
        lesson_ids: Vec<Uuid>,
        question_id: Uuid,
    }

    fn fixture(now: DateTime<Utc>) -> Fixture {
        let lessons = vec![
            lesson(0, LessonLevel::Beginner),
            lesson(1, LessonLevel::Intermediate),
        ];
        let question = mcq(lessons[0].id, &["syntax", "fundamentals"]);
        let user_id = Uuid::new_v4();

        let mut users = HashMap::new();
        users.insert(user_id, UserProgress::new(user_id, now - Duration::days(3)));

        Fixture {
            user_id,
            lesson_ids: lessons.iter().map(|l| l.id).collect(),
            question_id: question.id,
            store: MemoryStore {
                questions: HashMap::from([(question.id, question)]),
                lessons,
                users: Mutex::new(users),
                ..Default::default()
            },
        }
    }

    fn stored_user(store: &MemoryStore, user_id: Uuid) -> UserProgress {
        store.users.lock().unwrap()[&user_id].clone()
    }

    #[tokio::test]
    async fn first_correct_answer_earns_bonus_and_persists() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let outcome = service
            .submit_answer(fx.user_id, fx.question_id, &SubmittedAnswer::Index(1), now)
            .await
            .unwrap();

        assert!(outcome.is_correct);
        assert!(outcome.is_first_attempt);
        assert_eq!(outcome.xp_earned, 15);
        assert_eq!(outcome.streak, 1);
        let m = outcome.multipliers.unwrap();
        assert_eq!((m.streak, m.difficulty, m.first_time), (1.0, 1.0, 1.5));

        let user = stored_user(&fx.store, fx.user_id);
        assert_eq!(user.xp, 15);
        assert_eq!(user.streak_count, 1);
        assert_eq!(user.question_history.len(), 1);
        assert_eq!(user.concept_mastery["syntax"].repetition, 1);
        assert_eq!(user.concept_mastery["fundamentals"].repetition, 1);
    }

    #[tokio::test]
    async fn repeated_answer_is_not_first_attempt() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);
        let answer = SubmittedAnswer::Text("1".to_string());

        service
            .submit_answer(fx.user_id, fx.question_id, &answer, now)
            .await
            .unwrap();
        let second = service
            .submit_answer(fx.user_id, fx.question_id, &answer, now + Duration::minutes(1))
            .await
            .unwrap();

        assert!(!second.is_first_attempt);
        assert_eq!(second.multipliers.unwrap().first_time, 0.75);
        assert_eq!(second.xp_earned, 8);

        let user = stored_user(&fx.store, fx.user_id);
        assert_eq!(user.xp, 23);
        assert_eq!(user.question_history.len(), 1);
        assert_eq!(user.concept_mastery["syntax"].interval_days, 6);
    }

    #[tokio::test]
    async fn incorrect_answer_only_reschedules_concepts() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let outcome = service
            .submit_answer(fx.user_id, fx.question_id, &SubmittedAnswer::Index(2), now)
            .await
            .unwrap();

        assert!(!outcome.is_correct);
        assert_eq!(outcome.xp_earned, 0);
        assert_eq!(outcome.multipliers, None);

        let user = stored_user(&fx.store, fx.user_id);
        assert_eq!(user.xp, 0);
        assert_eq!(user.streak_count, 0);
        assert!(user.question_history.is_empty());
        assert_eq!(user.concept_mastery["syntax"].incorrect_count, 1);
    }

    #[tokio::test]
    async fn missing_question_aborts_without_mutation() {
        let now = Utc::now();
        let fx = fixture(now);
        let before = stored_user(&fx.store, fx.user_id);
        let service = ProgressService::new(&fx.store);

        let err = service
            .submit_answer(fx.user_id, Uuid::new_v4(), &SubmittedAnswer::Index(1), now)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(stored_user(&fx.store, fx.user_id), before);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let err = service
            .submit_answer(Uuid::new_v4(), fx.question_id, &SubmittedAnswer::Index(1), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_save_is_reported() {
        let now = Utc::now();
        let mut fx = fixture(now);
        fx.store.fail_saves = true;
        let service = ProgressService::new(&fx.store);

        let result = service
            .submit_answer(fx.user_id, fx.question_id, &SubmittedAnswer::Index(1), now)
            .await;

        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert_eq!(stored_user(&fx.store, fx.user_id).xp, 0);
    }

    #[tokio::test]
    async fn unsupported_kind_grades_incorrect() {
        let now = Utc::now();
        let mut fx = fixture(now);
        let debug = Question {
            id: Uuid::new_v4(),
            lesson_id: fx.lesson_ids[0],
            prompt: "Find the bug".to_string(),
            concepts: vec!["debugging".to_string()],
            body: QuestionBody::Unsupported {
                kind: QuestionKind::Debug.as_str().to_string(),
            },
        };
        let debug_id = debug.id;
        fx.store.questions.insert(debug_id, debug);
        let service = ProgressService::new(&fx.store);

        let outcome = service
            .submit_answer(fx.user_id, debug_id, &SubmittedAnswer::Text("x".to_string()), now)
            .await
            .unwrap();
        assert!(!outcome.is_correct);
        assert_eq!(stored_user(&fx.store, fx.user_id).concept_mastery["debugging"].repetition, 0);
    }

    #[tokio::test]
    async fn lesson_level_drives_difficulty() {
        let now = Utc::now();
        let mut fx = fixture(now);
        let question = mcq(fx.lesson_ids[1], &[]);
        let question_id = question.id;
        fx.store.questions.insert(question_id, question);
        let service = ProgressService::new(&fx.store);

        let outcome = service
            .submit_answer(fx.user_id, question_id, &SubmittedAnswer::Index(1), now)
            .await
            .unwrap();
        // 10 * 1.0 * 1.5 * 1.5
        assert_eq!(outcome.xp_earned, 23);
        assert_eq!(outcome.multipliers.unwrap().difficulty, 1.5);
    }

    #[tokio::test]
    async fn completing_lesson_unlocks_next_once() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let first = service
            .complete_lesson(fx.user_id, fx.lesson_ids[0], 80, now)
            .await
            .unwrap();
        assert_eq!(first.progress.status, LessonStatus::Completed);
        assert_eq!(first.progress.best_score, 80);
        assert_eq!(first.progress.attempts, 1);
        assert_eq!(first.unlocked_lesson_id, Some(fx.lesson_ids[1]));

        let second = service
            .complete_lesson(fx.user_id, fx.lesson_ids[0], 60, now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(second.progress.best_score, 80);
        assert_eq!(second.progress.attempts, 2);
        assert_eq!(second.unlocked_lesson_id, None);

        let records = fx.store.lesson_progress.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[&(fx.user_id, fx.lesson_ids[1])].status,
            LessonStatus::Unlocked
        );
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let err = service
            .complete_lesson(fx.user_id, fx.lesson_ids[0], 3_000_000_000, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(fx.store.lesson_progress.lock().unwrap().is_empty());

        let full = service
            .complete_lesson(fx.user_id, fx.lesson_ids[0], 100, now)
            .await
            .unwrap();
        assert_eq!(full.progress.best_score, 100);
    }

    #[tokio::test]
    async fn recompleting_does_not_reset_next_lesson() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        service
            .complete_lesson(fx.user_id, fx.lesson_ids[0], 90, now)
            .await
            .unwrap();
        service
            .complete_lesson(fx.user_id, fx.lesson_ids[1], 75, now)
            .await
            .unwrap();
        service
            .complete_lesson(fx.user_id, fx.lesson_ids[0], 95, now)
            .await
            .unwrap();

        let records = fx.store.lesson_progress.lock().unwrap();
        let next = &records[&(fx.user_id, fx.lesson_ids[1])];
        assert_eq!(next.status, LessonStatus::Completed);
        assert_eq!(next.best_score, 75);
    }

    #[tokio::test]
    async fn last_lesson_has_nothing_to_unlock() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let response = service
            .complete_lesson(fx.user_id, fx.lesson_ids[1], 100, now)
            .await
            .unwrap();
        assert_eq!(response.unlocked_lesson_id, None);
    }

    #[tokio::test]
    async fn completing_unknown_lesson_is_not_found() {
        let now = Utc::now();
        let fx = fixture(now);
        let service = ProgressService::new(&fx.store);

        let err = service
            .complete_lesson(fx.user_id, Uuid::new_v4(), 100, now)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(fx.store.lesson_progress.lock().unwrap().is_empty());
    }
}
