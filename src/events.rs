//! Ordered event channel between a run and its single consumer.
//!
//! Events are delivered in production order. The channel closes after a
//! terminal event (`Done`, `Failed`, or `Canceled`) when the run drops its
//! sender, so a consumer detects completion by the stream ending rather
//! than by polling. Non-streaming callers skip the channel entirely and
//! block on [`RunHandle::wait`](crate::agent_loop::RunHandle::wait).

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::agent_loop::CompletionReason;
use crate::types::{ToolCallRequest, ToolResult};

/// An observable event from one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Incremental assistant text.
    TokenDelta { text: String },
    /// A tool call is about to be dispatched.
    ToolStart { call: ToolCallRequest },
    /// A tool call resolved (result or error payload).
    ToolEnd { name: String, result: ToolResult },
    /// Terminal: the run produced its final text.
    Done {
        text: String,
        reason: CompletionReason,
    },
    /// Terminal: the run failed.
    Failed { error: String },
    /// Terminal: the run was canceled before completing.
    Canceled,
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. } | Self::Canceled)
    }
}

/// Create a connected sender/stream pair for one run.
pub fn event_channel() -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventStream { rx })
}

/// Producer side, held by the run task.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<TurnEvent>,
}

impl EventSender {
    /// Emit an event. A disconnected consumer is not an error; the run
    /// keeps going and its outcome is still delivered via the handle.
    pub fn emit(&self, event: TurnEvent) {
        let _ = self.tx.send(event);
    }
}

/// Consumer side: an ordered stream of [`TurnEvent`]s for exactly one run.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<TurnEvent>,
}

impl EventStream {
    /// Receive the next event, or `None` once the run has finished and
    /// drained.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        self.rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = TurnEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
