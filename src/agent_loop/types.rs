//! Run identifiers and outcomes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique run identifier.
pub type RunId = Uuid;

/// How a run reached its final text.
///
/// Hitting the step limit is a deliberate termination with a degraded
/// answer, reported as a distinct reason rather than an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// The model produced a final answer without requesting more tools.
    Completed,
    /// The configured maximum of tool rounds was reached.
    StepLimitExceeded,
}

/// The result of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Final assistant text (possibly degraded on step-limit exit).
    pub text: String,
    pub reason: CompletionReason,
    /// Model rounds consumed.
    pub steps: usize,
}
