// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quizforge::{
    config::Config,
    db::GenerationStore,
    error::AppError,
    generation::invoker::{InvokeError, ModelInvoker},
    models::{
        test_set::{GeneratedTest, NewTest, TestSummary},
        usage::{Plan, UsageCounters},
    },
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use sqlx::types::Json;

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

/// Store that keeps everything in memory for the lifetime of one test.
#[derive(Default)]
pub struct MemoryStore {
    tests: Mutex<Vec<GeneratedTest>>,
    usage: Mutex<HashMap<i64, UsageCounters>>,
    fail_usage_writes: AtomicBool,
}

impl MemoryStore {
    pub fn set_usage(&self, usage: UsageCounters) {
        self.usage.lock().unwrap().insert(usage.user_id, usage);
    }

    /// Makes every later usage update fail, as a lost database would.
    pub fn fail_usage_writes(&self) {
        self.fail_usage_writes.store(true, Ordering::SeqCst);
    }

    pub fn test_count(&self) -> usize {
        self.tests.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn usage(&self, user_id: i64) -> Result<UsageCounters, AppError> {
        Ok(self
            .usage
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UsageCounters::empty(user_id)))
    }

    async fn save_generated_test(
        &self,
        user_id: i64,
        plan: Plan,
        test: NewTest,
    ) -> Result<GeneratedTest, AppError> {
        // Both locks are held for the whole write, like one transaction.
        let mut usage = self.usage.lock().unwrap();
        let mut tests = self.tests.lock().unwrap();

        let current = usage
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UsageCounters::empty(user_id));
        current.check_test_limit(plan)?;

        if self.fail_usage_writes.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(
                "usage counters unavailable".to_string(),
            ));
        }

        let saved = GeneratedTest {
            id: tests.len() as i64 + 1,
            user_id,
            title: test.title,
            topic: test.topic,
            questions: Json(test.questions),
            created_at: chrono::Utc::now(),
        };
        usage.insert(
            user_id,
            UsageCounters {
                user_id,
                tests_generated: current.tests_generated + 1,
                questions_generated: current.questions_generated + saved.questions.len() as i64,
            },
        );
        tests.push(saved.clone());
        Ok(saved)
    }

    async fn get_test(&self, user_id: i64, id: i64) -> Result<Option<GeneratedTest>, AppError> {
        Ok(self
            .tests
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn list_tests(&self, user_id: i64) -> Result<Vec<TestSummary>, AppError> {
        Ok(self
            .tests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .map(|t| TestSummary {
                id: t.id,
                title: t.title.clone(),
                topic: t.topic.clone(),
                question_count: t.questions.len() as i64,
                created_at: t.created_at,
            })
            .collect())
    }
}

type Handler = Box<dyn Fn(&str) -> Result<String, InvokeError> + Send + Sync>;

/// Model stand-in driven by a closure over the prompt.
pub struct FakeModel {
    pub handler: Handler,
}

impl FakeModel {
    pub fn new(handler: impl Fn(&str) -> Result<String, InvokeError> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl ModelInvoker for FakeModel {
    async fn generate(&self, prompt: &str) -> Result<String, InvokeError> {
        (self.handler)(prompt)
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn token(&self, user_id: i64, plan: Plan) -> String {
        sign_jwt(user_id, plan, TEST_SECRET, 600).expect("Failed to sign token")
    }
}

/// Spawns the app on a random port with an in-memory store.
pub async fn spawn_app(model: FakeModel) -> TestApp {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
        llm_api_base: "http://127.0.0.1:1".to_string(),
        llm_api_key: "unused".to_string(),
        llm_model: "fake".to_string(),
        llm_max_attempts: 3,
        // No real waiting between retries in tests.
        llm_backoff_secs: 0,
    };

    let store = Arc::new(MemoryStore::default());
    let state = AppState {
        store: store.clone(),
        invoker: Arc::new(model),
        config,
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}
