// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    db::GenerationStore,
    generation::{invoker::ModelInvoker, retry::RetryPolicy},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GenerationStore>,
    pub invoker: Arc<dyn ModelInvoker>,
    pub config: Config,
}

impl AppState {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
