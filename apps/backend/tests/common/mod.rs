//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up test environment with database
//! - Helpers for seeding users, lessons and questions
//! - Authentication helpers
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL env var).

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::Router;
use sqlx::types::Json;
use uuid::Uuid;

use learntocode_backend::db::Database;
use learntocode_backend::models::{DbLesson, DbQuestion, DbUser};
use learntocode_backend::{build_router, AppState};

/// Test context containing database connection and test router.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub db: Arc<Database>,
    app: Router,
    lessons: std::sync::Mutex<Vec<Uuid>>,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let db = Arc::new(db);
        let app = build_router(AppState { db: db.clone() });

        Self {
            db,
            app,
            lessons: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Create a test user and return its ID and token.
    pub async fn create_test_user(&self) -> (Uuid, String) {
        let user = self
            .db
            .create_user(&fixtures::unique_username("tester"))
            .await
            .expect("Failed to create test user");
        (user.id, user.token)
    }

    pub async fn get_user(&self, user_id: Uuid) -> DbUser {
        self.db
            .get_user(user_id)
            .await
            .expect("Failed to load user")
            .expect("User missing")
    }

    /// Overwrite a user's XP directly.
    pub async fn set_user_xp(&self, user_id: Uuid, xp: i64) {
        sqlx::query("UPDATE users SET xp = $2 WHERE id = $1")
            .bind(user_id)
            .bind(xp)
            .execute(self.db.pool())
            .await
            .expect("Failed to set xp");
    }

    /// Insert a lesson at the given order. Removed again by `cleanup`.
    pub async fn seed_lesson(&self, order: i32, level: &str) -> DbLesson {
        let lesson = sqlx::query_as::<_, DbLesson>(
            r#"
            INSERT INTO lessons (slug, title, lesson_order, level, xp_reward, content)
            VALUES ($1, $2, $3, $4, 50, $5)
            RETURNING id, slug, title, description, lesson_order, level, xp_reward, content
            "#,
        )
        .bind(fixtures::unique_slug("lesson"))
        .bind(format!("Lesson {}", order))
        .bind(order)
        .bind(level)
        .bind(Json(fixtures::lesson_content()))
        .fetch_one(self.db.pool())
        .await
        .expect("Failed to seed lesson");

        self.lessons.lock().unwrap().push(lesson.id);
        lesson
    }

    /// Insert a question row as given.
    pub async fn seed_question(&self, question: &DbQuestion) {
        sqlx::query(
            r#"
            INSERT INTO questions (id, lesson_id, kind, prompt, code_template, options, blocks,
                                   solution_index, solution_text, solution_order, concepts)
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
        .execute(self.db.pool())
        .await
        .expect("Failed to seed question");
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> String {
        format!("Bearer {}", token)
    }

    /// Remove a user and every lesson this context seeded.
    ///
    /// Progress rows go with them through ON DELETE CASCADE.
    pub async fn cleanup(&self, user_ids: &[Uuid]) {
        for user_id in user_ids {
            let _ = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(self.db.pool())
                .await;
        }

        let lessons = std::mem::take(&mut *self.lessons.lock().unwrap());
        for lesson_id in lessons {
            let _ = sqlx::query("DELETE FROM lessons WHERE id = $1")
                .bind(lesson_id)
                .execute(self.db.pool())
                .await;
        }
    }
}
