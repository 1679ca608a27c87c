//! Model capability boundary.
//!
//! [`ModelClient`] is the only thing the loop knows about the language
//! model: given a message sequence and tool specs, it yields a stream of
//! [`ModelDelta`]s. [`openai::OpenAiClient`] is the default production
//! implementation; tests substitute scripted clients.

pub mod http;
pub mod openai;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::warn;

use crate::error::Result;
use crate::tools::ToolSpec;
use crate::types::{ChatMessage, ModelDelta, StreamEventType};

pub use openai::OpenAiClient;

/// Per-request generation settings.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// Model identifier sent to the endpoint.
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// One inference request: the replayed log plus the available tools.
/// An empty `tools` vector means pure chat mode.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSpec>,
    pub settings: ModelSettings,
}

/// Boundary to the language model endpoint.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Open a delta stream for one inference call.
    async fn stream(&self, request: &ModelRequest) -> Result<BoxStream<'static, Result<ModelDelta>>>;
}

/// Open a model stream with bounded retries for retryable failures.
pub(crate) async fn open_stream_with_retries(
    client: &dyn ModelClient,
    request: &ModelRequest,
    retries: usize,
) -> Result<BoxStream<'static, Result<ModelDelta>>> {
    let mut attempt = 0usize;
    loop {
        match client.stream(request).await {
            Ok(stream) => return Ok(stream),
            Err(err) if err.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!(error = %err, attempt, "model call failed, retrying");
                tokio::time::sleep(Duration::from_millis(250 * attempt as u64)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Drain a delta stream, returning the concatenated text. Tool-call
/// fragments are ignored; used by pure-memory mode where no tools are
/// offered.
pub(crate) async fn collect_final_text(
    mut stream: BoxStream<'static, Result<ModelDelta>>,
) -> Result<String> {
    let mut text = String::new();
    while let Some(delta) = stream.next().await {
        let delta = delta?;
        match delta.event_type {
            StreamEventType::TextDelta => text.push_str(&delta.text),
            StreamEventType::Error => {
                let message = if delta.text.is_empty() {
                    "stream error".to_string()
                } else {
                    delta.text
                };
                return Err(crate::error::MnemoError::Stream(message));
            }
            StreamEventType::Done => break,
            _ => {}
        }
    }
    Ok(text)
}
