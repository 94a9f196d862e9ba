// src/handlers/usage.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError, models::usage::UsageResponse, state::AppState, utils::jwt::Claims,
};

/// Returns the caller's usage counters alongside their plan limits.
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let usage = state.store.usage(claims.user_id()?).await?;

    Ok(Json(UsageResponse {
        plan: claims.plan,
        limits: claims.plan.limits(),
        usage,
    }))
}
