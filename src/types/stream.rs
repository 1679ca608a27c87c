//! Streaming delta types emitted by a [`ModelClient`](crate::model::ModelClient).

use serde::{Deserialize, Serialize};

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// Type of stream event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// Incremental final-answer text.
    TextDelta,
    /// A fragment of a tool call being assembled.
    ToolCallDelta,
    /// Stream started.
    Start,
    /// Stream finished.
    Done,
    /// Error during the stream.
    Error,
}

/// A fragment of one tool call, keyed by request index.
///
/// Providers stream tool calls piecewise: the first fragment for an index
/// carries the id and name, later fragments append argument text. Fragment
/// index order is the request order the loop must preserve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallFragment {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: String,
}

impl ToolCallFragment {
    /// A fragment carrying a complete call in one piece (used by stubs and
    /// non-streaming providers).
    pub fn complete(
        index: usize,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            index,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: arguments.to_string(),
        }
    }
}

/// A delta emitted while streaming one model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDelta {
    pub event_type: StreamEventType,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallFragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl ModelDelta {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            event_type: StreamEventType::TextDelta,
            text: text.into(),
            tool_call: None,
            finish_reason: None,
        }
    }

    pub fn tool_fragment(fragment: ToolCallFragment) -> Self {
        Self {
            event_type: StreamEventType::ToolCallDelta,
            text: String::new(),
            tool_call: Some(fragment),
            finish_reason: None,
        }
    }

    pub fn done(reason: Option<FinishReason>) -> Self {
        Self {
            event_type: StreamEventType::Done,
            text: String::new(),
            tool_call: None,
            finish_reason: reason,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            event_type: StreamEventType::Error,
            text: message.into(),
            tool_call: None,
            finish_reason: None,
        }
    }
}
