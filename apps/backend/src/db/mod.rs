//! PostgreSQL database operations

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::seed::CurriculumPlan;
use crate::services::progress::ProgressStore;

/// Number of users shown on the leaderboard.
pub const LEADERBOARD_SIZE: i64 = 50;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with a generated token
    pub async fn create_user(&self, username: &str) -> Result<DbUser> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            INSERT INTO users (username, token)
            VALUES ($1, $2)
            RETURNING id, username, token, xp, streak_count, last_active_at, created_at
            "#,
        )
        .bind(username)
        .bind(&token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check whether a username is taken
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, username, token, xp, streak_count, last_active_at, created_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(
            r#"
            SELECT id, username, token, xp, streak_count, last_active_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // === Curriculum Repository ===

    /// All lessons in curriculum order
    pub async fn list_lessons(&self) -> Result<Vec<DbLesson>> {
        let lessons = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT id, slug, title, description, lesson_order, level, xp_reward, content
            FROM lessons
            ORDER BY lesson_order
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(lessons)
    }

    pub async fn get_lesson_row(&self, lesson_id: Uuid) -> Result<Option<DbLesson>> {
        let lesson = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT id, slug, title, description, lesson_order, level, xp_reward, content
            FROM lessons
            WHERE id = $1
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn get_lesson_by_slug(&self, slug: &str) -> Result<Option<DbLesson>> {
        let lesson = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT id, slug, title, description, lesson_order, level, xp_reward, content
            FROM lessons
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    pub async fn get_lesson_row_by_order(&self, order: i32) -> Result<Option<DbLesson>> {
        let lesson = sqlx::query_as::<_, DbLesson>(
            r#"
            SELECT id, slug, title, description, lesson_order, level, xp_reward, content
            FROM lessons
            WHERE lesson_order = $1
            "#,
        )
        .bind(order)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lesson)
    }

    /// Replace every lesson and question with `plan`, in one transaction.
    pub async fn replace_curriculum(&self, plan: &CurriculumPlan) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM lessons").execute(&mut *tx).await?;

        for lesson in &plan.lessons {
            sqlx::query(
                r#"
                INSERT INTO lessons (id, slug, title, description, lesson_order, level,
                                     xp_reward, content)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(lesson.id)
            .bind(&lesson.slug)
            .bind(&lesson.title)
            .bind(&lesson.description)
            .bind(lesson.lesson_order)
            .bind(&lesson.level)
            .bind(lesson.xp_reward)
            .bind(&lesson.content)
            .execute(&mut *tx)
            .await?;
        }

        for question in &plan.questions {
            sqlx::query(
                r#"
                INSERT INTO questions (id, lesson_id, kind, prompt, code_template, options,
                                       blocks, solution_index, solution_text,
                                       solution_order, concepts)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(question.id)
            .bind(question.lesson_id)
            .bind(&question.kind)
            .bind(&question.prompt)
            .bind(&question.code_template)
            .bind(&question.options)
            .bind(&question.blocks)
            .bind(question.solution_index)
            .bind(&question.solution_text)
            .bind(&question.solution_order)
            .bind(&question.concepts)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_question_row(&self, question_id: Uuid) -> Result<Option<DbQuestion>> {
        let question = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, lesson_id, kind, prompt, code_template, options, blocks,
                   solution_index, solution_text, solution_order, concepts
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    /// Questions belonging to a lesson, in authoring order
    pub async fn questions_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<DbQuestion>> {
        let questions = sqlx::query_as::<_, DbQuestion>(
            r#"
            SELECT id, lesson_id, kind, prompt, code_template, options, blocks,
                   solution_index, solution_text, solution_order, concepts
            FROM questions
            WHERE lesson_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    // === Progress Repository ===

    /// Load a user's counters, concept mastery and answer history
    pub async fn get_user_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>> {
        let Some(user) = self.get_user(user_id).await? else {
            return Ok(None);
        };

        let mastery = self.get_concept_mastery(user_id).await?;

        let history = sqlx::query_as::<_, DbQuestionHistory>(
            r#"
            SELECT user_id, question_id, answered_at, correct
            FROM question_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(UserProgress {
            user_id,
            xp: user.xp.max(0) as u64,
            streak_count: user.streak_count.max(0) as u32,
            last_active_at: user.last_active_at,
            concept_mastery: mastery
                .into_iter()
                .map(|row| (row.concept.clone(), row.to_core()))
                .collect(),
            question_history: history
                .into_iter()
                .map(|row| (row.question_id, row.to_core()))
                .collect(),
        }))
    }

    /// Concept mastery rows for a user
    pub async fn get_concept_mastery(&self, user_id: Uuid) -> Result<Vec<DbConceptMastery>> {
        let rows = sqlx::query_as::<_, DbConceptMastery>(
            r#"
            SELECT user_id, concept, interval_days, repetition, ease_factor,
                   next_review_at, incorrect_count, last_reviewed_at
            FROM concept_mastery
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Write back everything a submission may have changed, atomically
    pub async fn put_user_progress(&self, progress: &UserProgress) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET xp = $2, streak_count = $3, last_active_at = $4
            WHERE id = $1
            "#,
        )
        .bind(progress.user_id)
        .bind(i64::try_from(progress.xp).unwrap_or(i64::MAX))
        .bind(i32::try_from(progress.streak_count).unwrap_or(i32::MAX))
        .bind(progress.last_active_at)
        .execute(&mut *tx)
        .await?;

        for mastery in progress.concept_mastery.values() {
            let row = DbConceptMastery::from_core(progress.user_id, mastery);
            sqlx::query(
                r#"
                INSERT INTO concept_mastery (user_id, concept, interval_days, repetition,
                                             ease_factor, next_review_at, incorrect_count,
                                             last_reviewed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (user_id, concept) DO UPDATE SET
                    interval_days = EXCLUDED.interval_days,
                    repetition = EXCLUDED.repetition,
                    ease_factor = EXCLUDED.ease_factor,
                    next_review_at = EXCLUDED.next_review_at,
                    incorrect_count = EXCLUDED.incorrect_count,
                    last_reviewed_at = EXCLUDED.last_reviewed_at,
                    updated_at = NOW()
                "#,
            )
            .bind(row.user_id)
            .bind(&row.concept)
            .bind(row.interval_days)
            .bind(row.repetition)
            .bind(row.ease_factor)
            .bind(row.next_review_at)
            .bind(row.incorrect_count)
            .bind(row.last_reviewed_at)
            .execute(&mut *tx)
            .await?;
        }

        for entry in progress.question_history.values() {
            sqlx::query(
                r#"
                INSERT INTO question_history (user_id, question_id, answered_at, correct)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, question_id) DO NOTHING
                "#,
            )
            .bind(progress.user_id)
            .bind(entry.question_id)
            .bind(entry.answered_at)
            .bind(entry.correct)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // === Lesson Progress Repository ===

    pub async fn get_lesson_progress_row(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<DbLessonProgress>> {
        let row = sqlx::query_as::<_, DbLessonProgress>(
            r#"
            SELECT user_id, lesson_id, status, best_score, attempts, last_attempt_at
            FROM lesson_progress
            WHERE user_id = $1 AND lesson_id = $2
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Every lesson progress record a user has
    pub async fn list_lesson_progress(&self, user_id: Uuid) -> Result<Vec<DbLessonProgress>> {
        let rows = sqlx::query_as::<_, DbLessonProgress>(
            r#"
            SELECT user_id, lesson_id, status, best_score, attempts, last_attempt_at
            FROM lesson_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Upsert a lesson progress record
    pub async fn upsert_lesson_progress(&self, row: &DbLessonProgress) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, status, best_score, attempts,
                                         last_attempt_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                status = EXCLUDED.status,
                best_score = EXCLUDED.best_score,
                attempts = EXCLUDED.attempts,
                last_attempt_at = EXCLUDED.last_attempt_at,
                updated_at = NOW()
            "#,
        )
        .bind(row.user_id)
        .bind(row.lesson_id)
        .bind(&row.status)
        .bind(row.best_score)
        .bind(row.attempts)
        .bind(row.last_attempt_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a lesson progress record unless one already exists
    pub async fn insert_lesson_progress(&self, row: &DbLessonProgress) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, status, best_score, attempts,
                                         last_attempt_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, lesson_id) DO NOTHING
            "#,
        )
        .bind(row.user_id)
        .bind(row.lesson_id)
        .bind(&row.status)
        .bind(row.best_score)
        .bind(row.attempts)
        .bind(row.last_attempt_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Leaderboard Repository ===

    /// Top users by XP
    pub async fn top_users(&self, limit: i64) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT id, username, xp, streak_count
            FROM users
            ORDER BY xp DESC, created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Users with strictly more XP than `xp`
    pub async fn count_users_above(&self, xp: i64) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE xp > $1")
            .bind(xp)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    pub async fn count_users(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl ProgressStore for Database {
    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>> {
        match self.get_question_row(question_id).await? {
            Some(row) => Ok(Some(row.to_core_question()?)),
            None => Ok(None),
        }
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>> {
        Ok(self
            .get_lesson_row(lesson_id)
            .await?
            .map(|row| row.to_core_lesson()))
    }

    async fn get_lesson_by_order(&self, order: i32) -> Result<Option<Lesson>> {
        Ok(self
            .get_lesson_row_by_order(order)
            .await?
            .map(|row| row.to_core_lesson()))
    }

    async fn load_user_progress(&self, user_id: Uuid) -> Result<Option<UserProgress>> {
        self.get_user_progress(user_id).await
    }

    async fn save_user_progress(&self, user: &UserProgress) -> Result<()> {
        self.put_user_progress(user).await
    }

    async fn get_lesson_progress(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<LessonProgress>> {
        Ok(self
            .get_lesson_progress_row(user_id, lesson_id)
            .await?
            .map(|row| row.to_core()))
    }

    async fn save_lesson_progress(&self, user_id: Uuid, progress: &LessonProgress) -> Result<()> {
        self.upsert_lesson_progress(&DbLessonProgress::from_core(user_id, progress))
            .await
    }

    async fn insert_lesson_progress_if_absent(
        &self,
        user_id: Uuid,
        progress: &LessonProgress,
    ) -> Result<bool> {
        self.insert_lesson_progress(&DbLessonProgress::from_core(user_id, progress))
            .await
    }
}
