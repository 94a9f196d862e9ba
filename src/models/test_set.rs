// src/models/test_set.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::QuestionRecord;

/// Represents the 'tests' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTest {
    pub id: i64,
    pub user_id: i64,
    pub title: String,

    /// The topic the questions were generated for.
    pub topic: String,

    /// Generated questions, multiple-choice first.
    /// Stored as a JSON array in the database.
    pub questions: Json<Vec<QuestionRecord>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Lightweight row for listing a user's tests.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    pub topic: String,
    pub question_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a freshly generated test.
#[derive(Debug, Clone)]
pub struct NewTest {
    pub title: String,
    pub topic: String,
    pub questions: Vec<QuestionRecord>,
}

/// DTO for requesting a new AI-generated test.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_counts))]
pub struct GenerateTestRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic: String,

    /// Optional context (notes, an article) the questions should draw from.
    #[validate(length(max = 20000))]
    pub reference_material: Option<String>,

    #[serde(default)]
    #[validate(range(max = 50))]
    pub multiple_choice_count: u32,

    #[serde(default)]
    #[validate(range(max = 50))]
    pub open_ended_count: u32,

    #[validate(length(max = 200))]
    pub title: Option<String>,
}

impl GenerateTestRequest {
    pub fn total_questions(&self) -> u32 {
        self.multiple_choice_count + self.open_ended_count
    }

    /// Title to store, defaulting to the topic.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => self.topic.trim().to_string(),
        }
    }
}

/// A test with no questions at all is rejected up front.
fn validate_counts(req: &GenerateTestRequest) -> Result<(), validator::ValidationError> {
    if req.total_questions() == 0 {
        return Err(validator::ValidationError::new("no_questions_requested"));
    }
    if req.topic.trim().is_empty() {
        return Err(validator::ValidationError::new("topic_blank"));
    }
    Ok(())
}
