//! Configuration (code > env > .env file).

use serde::{Deserialize, Serialize};

/// Configuration for the engine, orchestrator, and OpenAI-compatible client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemoConfig {
    /// API key for the model endpoint.
    pub api_key: Option<String>,
    /// Base URL override for the model endpoint.
    pub base_url: Option<String>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum tool rounds per run before forced termination.
    pub max_steps: usize,
    /// Per-call tool timeout in milliseconds.
    pub tool_timeout_ms: u64,
    /// Internal retries for opening a model stream (retryable errors only).
    pub model_retries: usize,
    /// Abort a model stream after this much silence. Zero disables.
    pub stream_idle_timeout_ms: u64,
}

impl Default for MnemoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            max_steps: 8,
            tool_timeout_ms: 30_000,
            model_retries: 1,
            stream_idle_timeout_ms: 120_000,
        }
    }
}

impl MnemoConfig {
    /// Load from environment variables, reading `.env` if present.
    ///
    /// `MNEMO_API_KEY` (falling back to `OPENAI_API_KEY`), `MNEMO_BASE_URL`,
    /// `MNEMO_MODEL`, `MNEMO_MAX_STEPS`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        config.api_key = std::env::var("MNEMO_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok();
        config.base_url = std::env::var("MNEMO_BASE_URL").ok();
        if let Ok(model) = std::env::var("MNEMO_MODEL") {
            config.model = model;
        }
        if let Some(steps) = std::env::var("MNEMO_MAX_STEPS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_steps = steps;
        }

        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_tool_timeout_ms(mut self, ms: u64) -> Self {
        self.tool_timeout_ms = ms;
        self
    }

    pub fn with_model_retries(mut self, retries: usize) -> Self {
        self.model_retries = retries;
        self
    }

    pub fn with_stream_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.stream_idle_timeout_ms = ms;
        self
    }
}
