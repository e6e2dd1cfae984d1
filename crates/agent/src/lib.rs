//! Coding agent core
//!
//! A conversational loop that lets an LLM read, list and edit files inside a
//! single sandbox directory.

use thiserror::Error;

pub mod console;
pub mod context;
pub mod loop_agent;
pub mod parser;
pub mod tools;

pub use console::{Console, TurnEvent};
pub use context::ContextBuilder;
pub use loop_agent::{AgentLoop, LoopState};
pub use parser::{parse, parse_line, LineOutcome, MalformedCall, ParsedCall, ToolInvocation};
pub use tools::{Sandbox, SandboxError, ToolCall, ToolError, ToolKind, ToolResult, Toolset};

/// Agent errors
///
/// Tool and provider failures are reported to the model or the console and
/// never surface here.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("◆ SANDBOX UNAVAILABLE: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("◆ CONSOLE ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("◆ TOOL RESULT ENCODING FAILED: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
