// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use url::Url;

/// Default points for a multiple-choice question when the model gives none.
pub const DEFAULT_MC_POINTS: u32 = 1;

/// Default points for an open-ended question when the model gives none.
pub const DEFAULT_OPEN_POINTS: u32 = 2;

const DEFAULT_LLM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub llm_api_base: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_max_attempts: u32,
    pub llm_backoff_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let llm_api_key = env::var("GEMINI_API_KEY")
            .expect("GEMINI_API_KEY must be set");

        let llm_api_base = env::var("LLM_API_BASE")
            .unwrap_or_else(|_| DEFAULT_LLM_API_BASE.to_string());
        if Url::parse(&llm_api_base).is_err() {
            panic!("LLM_API_BASE is not a valid URL: {}", llm_api_base);
        }

        let llm_model = env::var("LLM_MODEL")
            .unwrap_or_else(|_| "gemini-1.5-flash".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port: parse_or("PORT", 3000),
            llm_api_base,
            llm_api_key,
            llm_model,
            llm_max_attempts: parse_or("LLM_MAX_ATTEMPTS", 3),
            llm_backoff_secs: parse_or("LLM_BACKOFF_SECS", 2),
        }
    }
}

/// Reads an optional numeric variable, falling back to `default` when it is
/// missing or malformed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
