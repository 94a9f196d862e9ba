// src/db.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        test_set::{GeneratedTest, NewTest, TestSummary},
        usage::{Plan, UsageCounters},
    },
};

/// Persistence for generated tests and per-user usage counters.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Current counters, zeroed for users who never generated anything.
    async fn usage(&self, user_id: i64) -> Result<UsageCounters, AppError>;

    /// Saves `test` and counts it against the user's usage as one unit.
    ///
    /// The plan's test limit is checked again against the stored counters, so
    /// requests racing past the handler's early check cannot overshoot it.
    /// On any error nothing is saved and nothing is counted.
    async fn save_generated_test(
        &self,
        user_id: i64,
        plan: Plan,
        test: NewTest,
    ) -> Result<GeneratedTest, AppError>;

    async fn get_test(&self, user_id: i64, id: i64) -> Result<Option<GeneratedTest>, AppError>;

    /// The user's tests, newest first.
    async fn list_tests(&self, user_id: i64) -> Result<Vec<TestSummary>, AppError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenerationStore for PgStore {
    async fn usage(&self, user_id: i64) -> Result<UsageCounters, AppError> {
        let usage = sqlx::query_as::<_, UsageCounters>(
            r#"
            SELECT user_id, tests_generated, questions_generated
            FROM usage_counters
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch usage counters: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(usage.unwrap_or_else(|| UsageCounters::empty(user_id)))
    }

    async fn save_generated_test(
        &self,
        user_id: i64,
        plan: Plan,
        test: NewTest,
    ) -> Result<GeneratedTest, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        // 1. Make sure the counter row exists, then lock it until commit
        sqlx::query(
            "INSERT INTO usage_counters (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let usage = sqlx::query_as::<_, UsageCounters>(
            r#"
            SELECT user_id, tests_generated, questions_generated
            FROM usage_counters
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        // 2. Re-check against the locked row; dropping `tx` rolls back
        usage.check_test_limit(plan)?;

        // 3. Save the test
        let question_count = test.questions.len() as i64;
        let saved = sqlx::query_as::<_, GeneratedTest>(
            r#"
            INSERT INTO tests (user_id, title, topic, questions)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, topic, questions, created_at
            "#,
        )
        .bind(user_id)
        .bind(&test.title)
        .bind(&test.topic)
        .bind(Json(&test.questions))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save generated test: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        // 4. Count it
        sqlx::query(
            r#"
            UPDATE usage_counters SET
                tests_generated = tests_generated + 1,
                questions_generated = questions_generated + $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(question_count)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update usage counters: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(saved)
    }

    async fn get_test(&self, user_id: i64, id: i64) -> Result<Option<GeneratedTest>, AppError> {
        let test = sqlx::query_as::<_, GeneratedTest>(
            r#"
            SELECT id, user_id, title, topic, questions, created_at
            FROM tests
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(test)
    }

    async fn list_tests(&self, user_id: i64) -> Result<Vec<TestSummary>, AppError> {
        let tests = sqlx::query_as::<_, TestSummary>(
            r#"
            SELECT
                id,
                title,
                topic,
                jsonb_array_length(questions)::BIGINT AS question_count,
                created_at
            FROM tests
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list tests: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(tests)
    }
}
