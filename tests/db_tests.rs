// tests/db_tests.rs

//! PostgreSQL store tests. They need a running database and are skipped
//! when `DATABASE_URL` is not set.

use std::sync::Arc;

use quizforge::{
    db::{GenerationStore, PgStore},
    error::AppError,
    generation::fallback::fallback_records,
    models::{question::QuestionKind, test_set::NewTest, usage::Plan},
};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> Option<PgStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

/// A user id no earlier run has touched.
fn fresh_user(offset: i64) -> i64 {
    chrono::Utc::now().timestamp_micros() * 10 + offset
}

fn new_test(title: &str, questions: u32) -> NewTest {
    NewTest {
        title: title.to_string(),
        topic: "Rust".to_string(),
        questions: fallback_records(QuestionKind::OpenEnded, questions, 1, "Rust"),
    }
}

#[tokio::test]
async fn usage_is_zero_for_new_user() {
    let Some(store) = connect().await else { return };
    let user_id = fresh_user(1);

    let usage = store.usage(user_id).await.unwrap();

    assert_eq!(usage.user_id, user_id);
    assert_eq!(usage.tests_generated, 0);
    assert_eq!(usage.questions_generated, 0);
}

#[tokio::test]
async fn saved_tests_are_counted_and_listed() {
    let Some(store) = connect().await else { return };
    let user_id = fresh_user(2);

    let first = store
        .save_generated_test(user_id, Plan::Pro, new_test("First", 3))
        .await
        .unwrap();
    let second = store
        .save_generated_test(user_id, Plan::Pro, new_test("Second", 2))
        .await
        .unwrap();

    let usage = store.usage(user_id).await.unwrap();
    assert_eq!(usage.tests_generated, 2);
    assert_eq!(usage.questions_generated, 5);

    let list = store.list_tests(user_id).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, second.id);
    assert_eq!(list[0].question_count, 2);
    assert_eq!(list[1].id, first.id);
    assert_eq!(list[1].question_count, 3);

    let fetched = store.get_test(user_id, first.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "First");
    assert_eq!(fetched.questions.len(), 3);
    assert_eq!(fetched.questions[0].prompt, "Explain Rust in detail (Question 1)");

    // Owned by someone else
    assert!(store.get_test(user_id + 1, first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn save_rejected_at_plan_limit_leaves_no_row() {
    let Some(store) = connect().await else { return };
    let user_id = fresh_user(3);

    for n in 0..5 {
        store
            .save_generated_test(user_id, Plan::Free, new_test(&format!("Test {}", n), 1))
            .await
            .unwrap();
    }

    let result = store
        .save_generated_test(user_id, Plan::Free, new_test("One too many", 1))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(store.list_tests(user_id).await.unwrap().len(), 5);
    assert_eq!(store.usage(user_id).await.unwrap().tests_generated, 5);
}

#[tokio::test]
async fn concurrent_saves_stop_at_plan_limit() {
    let Some(store) = connect().await else { return };
    let store = Arc::new(store);
    let user_id = fresh_user(4);

    for n in 0..4 {
        store
            .save_generated_test(user_id, Plan::Free, new_test(&format!("Test {}", n), 1))
            .await
            .unwrap();
    }

    let handles: Vec<_> = (0..3)
        .map(|n| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .save_generated_test(user_id, Plan::Free, new_test(&format!("Race {}", n), 1))
                    .await
            })
        })
        .collect();

    let mut saved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => saved += 1,
            Err(AppError::Forbidden(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(saved, 1);
    assert_eq!(store.list_tests(user_id).await.unwrap().len(), 5);
    assert_eq!(store.usage(user_id).await.unwrap().tests_generated, 5);
}
