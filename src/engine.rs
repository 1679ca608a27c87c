//! Caller-facing surface: start streaming turns or block for the answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent_loop::{RunHandle, TurnOutcome, TurnRequest, TurnRunner};
use crate::config::MnemoConfig;
use crate::error::{MnemoError, Result};
use crate::model::{ModelClient, ModelSettings};
use crate::orchestrator::ConversationOrchestrator;
use crate::session::{InMemorySessionStore, SessionGuard, SessionStore};
use crate::tools::ToolRegistry;

/// Whether a turn may invoke tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnMode {
    /// Pure dialogue over the session memory; no tool schemas offered.
    MemoryOnly,
    /// Full agent loop with the registered tools.
    WithTools,
}

/// Wires the store, registry, and model into one conversation service.
pub struct Engine {
    store: Arc<dyn SessionStore>,
    tools: Arc<ToolRegistry>,
    empty_tools: Arc<ToolRegistry>,
    model: Arc<dyn ModelClient>,
    config: MnemoConfig,
    system_prompt: Option<String>,
    settings: ModelSettings,
}

impl Engine {
    /// Create an engine with an in-memory store and no tools.
    pub fn new(model: Arc<dyn ModelClient>, config: MnemoConfig) -> Self {
        let settings = ModelSettings {
            model: config.model.clone(),
            ..ModelSettings::default()
        };
        Self {
            store: Arc::new(InMemorySessionStore::new()),
            tools: Arc::new(ToolRegistry::empty()),
            empty_tools: Arc::new(ToolRegistry::empty()),
            model,
            config,
            system_prompt: None,
            settings,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The session store, for direct history access.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// A memory-only orchestrator sharing this engine's store and model.
    pub fn orchestrator(&self) -> ConversationOrchestrator {
        let orchestrator = ConversationOrchestrator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.model),
            self.config.clone(),
        )
        .with_settings(self.settings.clone());
        match &self.system_prompt {
            Some(prompt) => orchestrator.with_system_prompt(prompt.clone()),
            None => orchestrator,
        }
    }

    /// Start a turn, waiting for any in-flight run on the session to
    /// finish first. Creates the session on first reference.
    pub async fn start_turn(
        &self,
        session_id: &str,
        user_text: impl Into<String>,
        mode: TurnMode,
    ) -> RunHandle {
        let handle = self.store.get_or_create(session_id).await;
        let guard = handle.lock().await;
        self.spawn_run(guard, session_id, user_text.into(), mode)
    }

    /// Start a turn only if the session is idle; otherwise report
    /// [`MnemoError::SessionBusy`] immediately.
    pub async fn try_start_turn(
        &self,
        session_id: &str,
        user_text: impl Into<String>,
        mode: TurnMode,
    ) -> Result<RunHandle> {
        let handle = self.store.get_or_create(session_id).await;
        let guard = handle
            .try_lock()
            .ok_or_else(|| MnemoError::SessionBusy(session_id.to_string()))?;
        Ok(self.spawn_run(guard, session_id, user_text.into(), mode))
    }

    /// Run a turn to completion and return the outcome.
    pub async fn run_turn(
        &self,
        session_id: &str,
        user_text: impl Into<String>,
        mode: TurnMode,
    ) -> Result<TurnOutcome> {
        self.start_turn(session_id, user_text, mode).await.wait().await
    }

    fn spawn_run(
        &self,
        guard: SessionGuard,
        session_id: &str,
        user_text: String,
        mode: TurnMode,
    ) -> RunHandle {
        let tools = match mode {
            TurnMode::MemoryOnly => Arc::clone(&self.empty_tools),
            TurnMode::WithTools => Arc::clone(&self.tools),
        };
        let runner = TurnRunner::new(Arc::clone(&self.model), tools, self.config.clone());

        let mut request =
            TurnRequest::new(session_id, user_text).with_settings(self.settings.clone());
        if let Some(prompt) = &self.system_prompt {
            request = request.with_system_prompt(prompt.clone());
        }
        runner.start(guard, request)
    }
}
