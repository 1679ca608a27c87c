//! Core data types shared across the crate.

pub mod message;
pub mod stream;

pub use message::{ChatMessage, Role, ToolCallRequest, ToolResult};
pub use stream::{FinishReason, ModelDelta, StreamEventType, ToolCallFragment};
