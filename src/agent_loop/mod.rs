//! The tool-calling agent loop: one run per conversation turn.

pub mod runner;
pub mod types;

pub use runner::{RunHandle, TurnRequest, TurnRunner};
pub use types::{CompletionReason, RunId, TurnOutcome};
