//! Tool registry: immutable tool set plus dispatch by name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use super::tool::Tool;
use super::types::ToolSpec;
use super::ToolArguments;
use crate::error::{MnemoError, Result};
use crate::types::{ToolCallRequest, ToolResult};

/// The set of invocable tools for a conversation.
///
/// Registration order is stable and is the order `specs()` advertises to
/// the model. The set is immutable once built.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// A registry with no tools (pure-memory mode).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Specs for all registered tools, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.as_ref().spec()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute one requested call.
    ///
    /// Unknown names, tool failures, and timeouts all come back as error
    /// results fed to the model on the next round; they never abort a run.
    pub async fn dispatch(&self, call: &ToolCallRequest, timeout_ms: u64) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "unknown tool requested");
            return ToolResult::error(&call.id, format!("unknown tool '{}'", call.name));
        };

        debug!(tool = %call.name, call_id = %call.id, "dispatching tool call");
        let args = ToolArguments::new(call.arguments.clone());
        match time::timeout(Duration::from_millis(timeout_ms), tool.invoke(&args)).await {
            Ok(Ok(content)) => ToolResult::ok(&call.id, content),
            Ok(Err(err)) => {
                warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
                ToolResult::error(&call.id, err.to_string())
            }
            Err(_) => {
                warn!(tool = %call.name, call_id = %call.id, timeout_ms, "tool call timed out");
                ToolResult::error(
                    &call.id,
                    format!("tool '{}' timed out after {timeout_ms}ms", call.name),
                )
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

/// Builder enforcing unique names at registration time.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(MnemoError::InvalidArgument(format!(
                "duplicate tool name '{}'",
                tool.name()
            )));
        }
        self.tools.push(tool);
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        let by_name = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();
        ToolRegistry {
            tools: self.tools,
            by_name,
        }
    }
}
