//! mnemo — session memory and tool-loop core for LLM-backed conversations.
//!
//! Gives a stateless model the appearance of conversational memory via an
//! append-only per-session [`MessageLog`](session::MessageLog), and drives
//! an explicit agent loop that alternates model inference with tool
//! execution, streaming [`TurnEvent`](events::TurnEvent)s to the caller
//! until a final answer is produced.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use mnemo::prelude::*;
//!
//! # async fn example() -> mnemo::error::Result<()> {
//! let config = MnemoConfig::from_env();
//! let model = Arc::new(OpenAiClient::from_config(&config)?);
//! let engine = Engine::new(model, config);
//!
//! let outcome = engine
//!     .run_turn("session-1", "Hello!", TurnMode::MemoryOnly)
//!     .await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod model;
pub mod orchestrator;
pub mod prelude;
pub mod session;
pub mod tools;
pub mod types;
