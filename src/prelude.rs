//! Convenience re-exports for common usage.

pub use crate::agent_loop::{CompletionReason, RunHandle, TurnOutcome, TurnRequest, TurnRunner};
pub use crate::config::MnemoConfig;
pub use crate::engine::{Engine, TurnMode};
pub use crate::error::{MnemoError, Result};
pub use crate::events::{EventStream, TurnEvent};
pub use crate::model::{ModelClient, ModelRequest, ModelSettings, OpenAiClient};
pub use crate::orchestrator::ConversationOrchestrator;
pub use crate::session::{InMemorySessionStore, MessageLog, Session, SessionStore};
pub use crate::tools::{FnTool, Tool, ToolArguments, ToolParameters, ToolRegistry, ToolSpec};
pub use crate::types::{ChatMessage, ModelDelta, Role, ToolCallRequest, ToolResult};
