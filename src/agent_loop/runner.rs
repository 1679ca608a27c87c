//! The run state machine: model rounds alternating with tool rounds.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::time::{self, Duration};
use tracing::debug;
use uuid::Uuid;

use crate::config::MnemoConfig;
use crate::error::{MnemoError, Result};
use crate::events::{event_channel, EventSender, EventStream, TurnEvent};
use crate::model::{open_stream_with_retries, ModelClient, ModelRequest, ModelSettings};
use crate::session::SessionGuard;
use crate::tools::ToolRegistry;
use crate::types::{ChatMessage, StreamEventType, ToolCallRequest};

use super::types::{CompletionReason, RunId, TurnOutcome};

/// Request payload to start a run.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub run_id: RunId,
    pub session_id: String,
    pub user_text: String,
    pub system_prompt: Option<String>,
    pub settings: ModelSettings,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            session_id: session_id.into(),
            user_text: user_text.into(),
            system_prompt: None,
            settings: ModelSettings::default(),
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
}

/// Handle for an in-flight run.
///
/// Dropping the handle without calling [`RunHandle::wait`] cancels the run
/// at its next suspension point.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    abort_tx: Option<oneshot::Sender<()>>,
    events: Option<EventStream>,
    result_rx: oneshot::Receiver<Result<TurnOutcome>>,
}

impl RunHandle {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Request cooperative cancellation. Returns false if the run already
    /// finished or was previously aborted.
    pub fn abort(&mut self) -> bool {
        if let Some(tx) = self.abort_tx.take() {
            return tx.send(()).is_ok();
        }
        false
    }

    /// Take the event stream (once). `None` after the first call.
    pub fn take_events(&mut self) -> Option<EventStream> {
        self.events.take()
    }

    /// Block until the run finishes and return its outcome. Cancellation
    /// and failure come back as errors, never as a partial outcome.
    pub async fn wait(mut self) -> Result<TurnOutcome> {
        (&mut self.result_rx)
            .await
            .unwrap_or_else(|_| Err(MnemoError::Stream("run task dropped before completing".into())))
    }
}

/// Drives one session turn to a final answer.
pub struct TurnRunner {
    model: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    config: MnemoConfig,
}

impl TurnRunner {
    pub fn new(model: Arc<dyn ModelClient>, tools: Arc<ToolRegistry>, config: MnemoConfig) -> Self {
        Self {
            model,
            tools,
            config,
        }
    }

    /// Start a run against an exclusively held session.
    ///
    /// The guard travels into the run task and is released when the run
    /// reaches a terminal state, which is what serializes runs per session.
    pub fn start(&self, session: SessionGuard, request: TurnRequest) -> RunHandle {
        let (abort_tx, mut abort_rx) = oneshot::channel();
        let (result_tx, result_rx) = oneshot::channel();
        let (events_tx, events_rx) = event_channel();

        let model = Arc::clone(&self.model);
        let tools = Arc::clone(&self.tools);
        let config = self.config.clone();
        let run_id = request.run_id;

        tokio::spawn(async move {
            debug!(
                run_id = %run_id,
                session = %request.session_id,
                tools = tools.len(),
                "run start"
            );
            let outcome =
                run_loop(&*model, &tools, &config, session, &request, &events_tx, &mut abort_rx)
                    .await;
            match &outcome {
                Ok(result) => {
                    debug!(run_id = %run_id, steps = result.steps, reason = ?result.reason, "run finished");
                }
                Err(MnemoError::Canceled) => {
                    debug!(run_id = %run_id, "run canceled");
                    events_tx.emit(TurnEvent::Canceled);
                }
                Err(err) => {
                    debug!(run_id = %run_id, error = %err, "run failed");
                    events_tx.emit(TurnEvent::Failed {
                        error: err.to_string(),
                    });
                }
            }
            let _ = result_tx.send(outcome);
        });

        RunHandle {
            run_id,
            abort_tx: Some(abort_tx),
            events: Some(events_rx),
            result_rx,
        }
    }
}

/// Accumulator for one tool call assembled from stream fragments, keyed by
/// request index.
#[derive(Default)]
struct PendingCall {
    id: String,
    name: String,
    arguments: String,
}

impl PendingCall {
    fn finalize(self) -> ToolCallRequest {
        let arguments = if self.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&self.arguments)
                .unwrap_or(serde_json::Value::String(self.arguments))
        };
        let id = if self.id.is_empty() {
            format!("call_{}", Uuid::new_v4().simple())
        } else {
            self.id
        };
        ToolCallRequest {
            id,
            name: self.name,
            arguments,
        }
    }
}

fn abort_requested(abort_rx: &mut oneshot::Receiver<()>) -> bool {
    // Closed means the handle was dropped, which also cancels.
    !matches!(
        abort_rx.try_recv(),
        Err(oneshot::error::TryRecvError::Empty)
    )
}

/// Resolves when the idle deadline passes; pends forever when disabled.
async fn idle_elapsed(sleep: &mut Option<Pin<Box<time::Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => futures::future::pending().await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop(
    model: &dyn ModelClient,
    tools: &ToolRegistry,
    config: &MnemoConfig,
    mut session: SessionGuard,
    request: &TurnRequest,
    events: &EventSender,
    abort_rx: &mut oneshot::Receiver<()>,
) -> Result<TurnOutcome> {
    session.touch();
    session.log.append(ChatMessage::user(&request.user_text));

    let specs = tools.specs();
    let mut transcript = String::new();

    for step in 1..=config.max_steps {
        // Suspension point: check cancellation before each model call.
        if abort_requested(abort_rx) {
            return Err(MnemoError::Canceled);
        }

        let mut messages = Vec::with_capacity(session.log.len() + 1);
        if let Some(prompt) = &request.system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend_from_slice(session.log.messages());
        let model_request = ModelRequest {
            messages,
            tools: specs.clone(),
            settings: request.settings.clone(),
        };

        let mut stream =
            open_stream_with_retries(model, &model_request, config.model_retries).await?;

        let mut step_text = String::new();
        let mut pending: BTreeMap<usize, PendingCall> = BTreeMap::new();
        let idle_ms = config.stream_idle_timeout_ms;
        let mut idle_sleep =
            (idle_ms > 0).then(|| Box::pin(time::sleep(Duration::from_millis(idle_ms))));

        'stream: loop {
            tokio::select! {
                _ = &mut *abort_rx => {
                    return Err(MnemoError::Canceled);
                }
                _ = idle_elapsed(&mut idle_sleep) => {
                    return Err(MnemoError::Timeout(idle_ms));
                }
                delta = stream.next() => {
                    let Some(delta) = delta else { break 'stream; };
                    let delta = delta?;
                    if let Some(sleep) = idle_sleep.as_mut() {
                        sleep.as_mut().reset(time::Instant::now() + Duration::from_millis(idle_ms));
                    }
                    match delta.event_type {
                        StreamEventType::TextDelta => {
                            if !delta.text.is_empty() {
                                step_text.push_str(&delta.text);
                                events.emit(TurnEvent::TokenDelta { text: delta.text });
                            }
                        }
                        StreamEventType::ToolCallDelta => {
                            if let Some(fragment) = delta.tool_call {
                                let entry = pending.entry(fragment.index).or_default();
                                if let Some(id) = fragment.id {
                                    entry.id = id;
                                }
                                if let Some(name) = fragment.name {
                                    entry.name = name;
                                }
                                entry.arguments.push_str(&fragment.arguments);
                            }
                        }
                        StreamEventType::Error => {
                            let message = if delta.text.is_empty() {
                                "stream error".to_string()
                            } else {
                                delta.text
                            };
                            return Err(MnemoError::Stream(message));
                        }
                        StreamEventType::Done => break 'stream,
                        StreamEventType::Start => {}
                    }
                }
            }
        }
        drop(stream);

        if pending.is_empty() {
            // Terminal: the streamed text is the final answer.
            session.log.append(ChatMessage::assistant(&step_text));
            events.emit(TurnEvent::Done {
                text: step_text.clone(),
                reason: CompletionReason::Completed,
            });
            return Ok(TurnOutcome {
                text: step_text,
                reason: CompletionReason::Completed,
                steps: step,
            });
        }

        if !step_text.is_empty() {
            if !transcript.is_empty() {
                transcript.push('\n');
            }
            transcript.push_str(&step_text);
        }

        let calls: Vec<ToolCallRequest> =
            pending.into_values().map(PendingCall::finalize).collect();
        session
            .log
            .append(ChatMessage::assistant_with_calls(step_text, calls.clone()));

        // Suspension point: check cancellation before dispatching tools.
        if abort_requested(abort_rx) {
            return Err(MnemoError::Canceled);
        }

        for call in &calls {
            events.emit(TurnEvent::ToolStart { call: call.clone() });
        }

        // Calls from one model turn run concurrently; join_all is the
        // barrier and returns results in request order. ToolEnd fires per
        // call as it resolves, so observers see completion order live.
        let results = join_all(calls.iter().map(|call| async move {
            let result = tools.dispatch(call, config.tool_timeout_ms).await;
            events.emit(TurnEvent::ToolEnd {
                name: call.name.clone(),
                result: result.clone(),
            });
            result
        }))
        .await;

        // Tools were allowed to finish, but a canceled run appends nothing.
        if abort_requested(abort_rx) {
            return Err(MnemoError::Canceled);
        }

        for (call, result) in calls.iter().zip(results) {
            session
                .log
                .append(ChatMessage::tool_result(&result, &call.name));
        }

        debug!(
            run_id = %request.run_id,
            step,
            calls = calls.len(),
            "tool round complete"
        );
    }

    // Forced termination: report the degraded answer rather than looping.
    if !transcript.is_empty() {
        session.log.append(ChatMessage::assistant(&transcript));
    }
    events.emit(TurnEvent::Done {
        text: transcript.clone(),
        reason: CompletionReason::StepLimitExceeded,
    });
    Ok(TurnOutcome {
        text: transcript,
        reason: CompletionReason::StepLimitExceeded,
        steps: config.max_steps,
    })
}
