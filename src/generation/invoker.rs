// src/generation/invoker.rs

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use url::Url;

use crate::config::Config;

/// Failure reported by a model provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The provider answered with a non-success HTTP status.
    Status { code: u16, body: String },
    /// The request never produced a response (DNS, TLS, timeout...).
    Transport(String),
    /// A success response that carried no generated text.
    EmptyResponse,
}

impl InvokeError {
    /// Overload signals are worth retrying; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            InvokeError::Status { code, body } => *code == 503 || mentions_overload(body),
            InvokeError::Transport(msg) => mentions_overload(msg),
            InvokeError::EmptyResponse => false,
        }
    }
}

fn mentions_overload(text: &str) -> bool {
    text.to_lowercase().contains("overloaded")
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::Status { code, body } => write!(f, "model API error {}: {}", code, body),
            InvokeError::Transport(msg) => write!(f, "model API unreachable: {}", msg),
            InvokeError::EmptyResponse => write!(f, "model API returned no text"),
        }
    }
}

impl std::error::Error for InvokeError {}

impl From<reqwest::Error> for InvokeError {
    fn from(err: reqwest::Error) -> Self {
        InvokeError::Transport(err.to_string())
    }
}

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InvokeError>;
}

/// Client for a Gemini-style `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiInvoker {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiInvoker {
    pub fn new(client: Client, api_base: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_base,
            api_key,
            model,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Client::new(),
            config.llm_api_base.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        )
    }

    fn endpoint(&self) -> Result<Url, InvokeError> {
        let base = self.api_base.trim_end_matches('/');
        let raw = format!("{}/models/{}:generateContent", base, self.model);
        let mut url = Url::parse(&raw).map_err(|e| InvokeError::Transport(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl ModelInvoker for GeminiInvoker {
    async fn generate(&self, prompt: &str) -> Result<String, InvokeError> {
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let res = self
            .client
            .post(self.endpoint()?)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let code = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(InvokeError::Status { code, body });
        }

        let body: Value = res.json().await?;
        extract_text(&body).ok_or(InvokeError::EmptyResponse)
    }
}

/// Joins the text parts of the first candidate.
pub fn extract_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() { None } else { Some(text) }
}
