//! Memory-only conversation mode: read the log, infer once, write back.

use std::sync::Arc;

use tracing::debug;

use crate::config::MnemoConfig;
use crate::error::Result;
use crate::model::{collect_final_text, open_stream_with_retries, ModelClient, ModelRequest, ModelSettings};
use crate::session::SessionStore;
use crate::types::ChatMessage;

/// The read-then-augment / execute / write-back cycle without tools.
///
/// The session guard is held across the whole cycle, so no other run can
/// observe a half-updated log: the user and assistant messages land
/// together, in that order, before the guard is released.
pub struct ConversationOrchestrator {
    store: Arc<dyn SessionStore>,
    model: Arc<dyn ModelClient>,
    config: MnemoConfig,
    system_prompt: Option<String>,
    settings: ModelSettings,
}

impl ConversationOrchestrator {
    pub fn new(store: Arc<dyn SessionStore>, model: Arc<dyn ModelClient>, config: MnemoConfig) -> Self {
        let settings = ModelSettings {
            model: config.model.clone(),
            ..ModelSettings::default()
        };
        Self {
            store,
            model,
            config,
            system_prompt: None,
            settings,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Answer `user_text` within the session's accumulated context.
    ///
    /// An empty log degenerates to a single-turn exchange.
    pub async fn respond(&self, session_id: &str, user_text: impl Into<String>) -> Result<String> {
        let user_text = user_text.into();
        let handle = self.store.get_or_create(session_id).await;
        let mut session = handle.lock().await;
        session.touch();

        debug!(session = %session_id, history = session.log.len(), "memory-only respond");

        // READ: full prior log, augmented with the new user message.
        let mut messages = Vec::with_capacity(session.log.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend_from_slice(session.log.messages());
        messages.push(ChatMessage::user(&user_text));

        // No tool schemas offered in this mode.
        let request = ModelRequest {
            messages,
            tools: Vec::new(),
            settings: self.settings.clone(),
        };
        let stream =
            open_stream_with_retries(self.model.as_ref(), &request, self.config.model_retries)
                .await?;
        let answer = collect_final_text(stream).await?;

        // WRITE: user first, then assistant, before releasing the guard.
        session.log.append(ChatMessage::user(user_text));
        session.log.append(ChatMessage::assistant(&answer));

        Ok(answer)
    }
}
