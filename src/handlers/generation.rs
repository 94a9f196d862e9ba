// src/handlers/generation.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use validator::Validate;

use crate::{
    error::AppError,
    generation::service::{KindReport, generate_batch},
    models::test_set::{GenerateTestRequest, GeneratedTest, NewTest},
    state::AppState,
    utils::jwt::Claims,
};

/// Response body for a successful generation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestResponse {
    pub test: GeneratedTest,
    pub reports: Vec<KindReport>,
}

/// Generates a new AI test for the authenticated user.
///
/// * Validates the request and checks plan limits against usage counters.
/// * Calls the model once per requested kind (with retry).
/// * Persists the test and counts it against the user's usage in one step,
///   re-checking the test limit so concurrent requests cannot exceed it.
///
/// A kind that failed outright is reported in `reports` while the other
/// kind is still returned. Only when everything failed is this a 502.
pub async fn generate_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;
    let usage = state.store.usage(user_id).await?;
    usage.check_entitlement(claims.plan, payload.total_questions())?;

    tracing::info!(
        "User {} generating test on {:?} ({} MC, {} open-ended)",
        user_id,
        payload.topic,
        payload.multiple_choice_count,
        payload.open_ended_count
    );

    let batch = generate_batch(
        state.invoker.as_ref(),
        &payload,
        &state.retry_policy(),
        1,
    )
    .await;

    if batch.all_failed() {
        let reasons: Vec<String> = batch
            .reports
            .iter()
            .filter_map(|r| r.message.clone())
            .collect();
        return Err(AppError::BadGateway(reasons.join("; ")));
    }

    let test = state
        .store
        .save_generated_test(
            user_id,
            claims.plan,
            NewTest {
                title: payload.display_title(),
                topic: payload.topic.trim().to_string(),
                questions: batch.questions,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateTestResponse {
            test,
            reports: batch.reports,
        }),
    ))
}
