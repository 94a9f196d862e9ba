// src/models/usage.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Subscription plan carried in the user's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
    Enterprise,
}

impl FromStr for Plan {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(AppError::AuthError(format!("Unknown plan '{}'", other))),
        }
    }
}

/// Limits derived from a plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_tests: Option<i64>,
    pub max_questions_per_test: Option<i64>,
}

impl Plan {
    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                max_tests: Some(5),
                max_questions_per_test: Some(10),
            },
            Plan::Pro => PlanLimits {
                max_tests: Some(200),
                max_questions_per_test: Some(50),
            },
            Plan::Enterprise => PlanLimits {
                max_tests: None,
                max_questions_per_test: None,
            },
        }
    }
}

/// Represents the 'usage_counters' table.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub user_id: i64,
    pub tests_generated: i64,
    pub questions_generated: i64,
}

impl UsageCounters {
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Checks whether one more generation of `requested_questions` fits the plan.
    pub fn check_entitlement(&self, plan: Plan, requested_questions: u32) -> Result<(), AppError> {
        let limits = plan.limits();

        if let Some(max) = limits.max_questions_per_test {
            if i64::from(requested_questions) > max {
                return Err(AppError::Forbidden(format!(
                    "Your plan allows at most {} questions per test",
                    max
                )));
            }
        }

        self.check_test_limit(plan)
    }

    /// Checks only the plan's test count. Stores re-run this against locked
    /// counters when the test is saved.
    pub fn check_test_limit(&self, plan: Plan) -> Result<(), AppError> {
        if let Some(max) = plan.limits().max_tests {
            if self.tests_generated >= max {
                return Err(AppError::Forbidden(format!(
                    "Generation limit reached ({} of {} tests)",
                    self.tests_generated, max
                )));
            }
        }

        Ok(())
    }
}

/// Response DTO for `/api/usage`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub plan: Plan,
    pub usage: UsageCounters,
    pub limits: PlanLimits,
}
