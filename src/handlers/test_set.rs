// src/handlers/test_set.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, state::AppState, utils::jwt::Claims};

/// Lists the caller's generated tests, newest first.
pub async fn list_tests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let tests = state.store.list_tests(claims.user_id()?).await?;
    Ok(Json(tests))
}

/// Fetches one of the caller's tests with all its questions.
pub async fn get_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let test = state
        .store
        .get_test(claims.user_id()?, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test {} not found", id)))?;

    Ok(Json(test))
}
