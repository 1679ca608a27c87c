//! Shared stubs for integration tests: scripted model clients and tools.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use mnemo::error::{MnemoError, Result};
use mnemo::model::{ModelClient, ModelRequest};
use mnemo::tools::{FnTool, Tool, ToolParameters};
use mnemo::types::{FinishReason, ModelDelta, Role, ToolCallFragment};

/// A model client that replays pre-scripted delta sequences, one per call,
/// recording every request it receives.
pub struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<ModelDelta>>>,
    fallback: Option<Vec<ModelDelta>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<Vec<ModelDelta>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers every call with the same delta sequence.
    pub fn repeating(turn: Vec<ModelDelta>) -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            fallback: Some(turn),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn stream(&self, request: &ModelRequest) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        self.requests.lock().unwrap().push(request.clone());
        let deltas = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| text_turn(""));
        Ok(Box::pin(futures::stream::iter(deltas.into_iter().map(Ok))))
    }
}

/// A model client that answers with the visible conversation joined by
/// " | ", exposing exactly what context it was given.
pub struct EchoModel;

#[async_trait]
impl ModelClient for EchoModel {
    async fn stream(&self, request: &ModelRequest) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        let text = request
            .messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join(" | ");
        Ok(Box::pin(futures::stream::iter(
            text_turn(&text).into_iter().map(Ok),
        )))
    }
}

/// A model client that stalls before answering, for cancellation and
/// serialization tests.
pub struct SlowModel {
    pub delay_ms: u64,
    pub reply: String,
}

#[async_trait]
impl ModelClient for SlowModel {
    async fn stream(&self, _request: &ModelRequest) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        let delay = Duration::from_millis(self.delay_ms);
        let reply = self.reply.clone();
        let stream = async_stream::stream! {
            tokio::time::sleep(delay).await;
            yield Ok(ModelDelta::text(reply));
            yield Ok(ModelDelta::done(Some(FinishReason::Stop)));
        };
        Ok(Box::pin(stream))
    }
}

/// A model client whose every call fails with the given API status,
/// counting attempts. For retry and run-level failure tests.
pub struct FailingModel {
    pub status: u16,
    attempts: AtomicUsize,
}

impl FailingModel {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for FailingModel {
    async fn stream(&self, _request: &ModelRequest) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MnemoError::api(self.status, "endpoint unavailable"))
    }
}

/// A model client whose stream opens fine but never yields a delta, for
/// idle-timeout tests.
pub struct SilentModel;

#[async_trait]
impl ModelClient for SilentModel {
    async fn stream(&self, _request: &ModelRequest) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        Ok(Box::pin(futures::stream::pending()))
    }
}

/// Script for a turn ending in plain text.
pub fn text_turn(text: &str) -> Vec<ModelDelta> {
    vec![
        ModelDelta::text(text),
        ModelDelta::done(Some(FinishReason::Stop)),
    ]
}

/// Script for a turn requesting the given `(id, name, arguments)` calls.
pub fn tool_turn(calls: &[(&str, &str, serde_json::Value)]) -> Vec<ModelDelta> {
    let mut deltas: Vec<ModelDelta> = calls
        .iter()
        .enumerate()
        .map(|(index, (id, name, args))| {
            ModelDelta::tool_fragment(ToolCallFragment::complete(index, *id, *name, args.clone()))
        })
        .collect();
    deltas.push(ModelDelta::done(Some(FinishReason::ToolCalls)));
    deltas
}

/// A tool that sleeps before replying with its own name.
pub fn sleepy_tool(name: &'static str, delay_ms: u64) -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        name,
        format!("test tool {name}"),
        ToolParameters::empty(),
        move |_args| async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            Ok(serde_json::json!({ "tool": name }))
        },
    ))
}

/// A tool that always fails with the given message.
pub fn failing_tool(name: &'static str, message: &'static str) -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        name,
        format!("always-failing test tool {name}"),
        ToolParameters::empty(),
        move |_args| async move {
            Err(MnemoError::ToolExecution {
                tool_name: name.to_string(),
                message: message.to_string(),
            })
        },
    ))
}

/// A tool that counts its invocations.
pub fn counting_tool(name: &'static str, counter: Arc<AtomicUsize>) -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        name,
        format!("counting test tool {name}"),
        ToolParameters::empty(),
        move |_args| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!("ok"))
            }
        },
    ))
}
