//! Tool system: the invocation contract, the registry, and built-in
//! web-grounding tools.

pub mod arguments;
pub mod builtin;
pub mod registry;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use tool::{FnTool, Tool};
pub use types::{ToolParameters, ToolSpec};
