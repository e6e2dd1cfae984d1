//! Tool-call extraction from model replies
//!
//! A call is a line of the form `tool: NAME({json object})`. Each physical line
//! is judged on its own; prose around calls is ignored.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

/// Line prefix announcing a tool call
pub const TOOL_PREFIX: &str = "tool:";

/// A syntactically valid call, not yet checked against the tool set
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub args: Map<String, Value>,
}

/// A `tool:` line whose argument payload is not a JSON object
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid arguments for {tool_name}: {error}")]
pub struct MalformedCall {
    pub tool_name: String,
    pub payload: String,
    pub error: String,
}

/// How a single line was read
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Ignored,
    Call(ToolInvocation),
    Malformed(MalformedCall),
}

pub type ParsedCall = Result<ToolInvocation, MalformedCall>;

pub fn parse_line(line: &str) -> LineOutcome {
    let Some(after) = line.trim().strip_prefix(TOOL_PREFIX) else {
        return LineOutcome::Ignored;
    };
    let after = after.trim();
    if !after.ends_with(')') {
        return LineOutcome::Ignored;
    }
    let Some((name, rest)) = after.split_once('(') else {
        return LineOutcome::Ignored;
    };

    let tool_name = name.trim().to_string();
    let payload = rest.strip_suffix(')').unwrap_or(rest).trim();

    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(args)) => LineOutcome::Call(ToolInvocation { tool_name, args }),
        Ok(other) => LineOutcome::Malformed(MalformedCall {
            tool_name,
            payload: payload.to_string(),
            error: format!("expected a JSON object, got {}", json_kind(&other)),
        }),
        Err(e) => LineOutcome::Malformed(MalformedCall {
            tool_name,
            payload: payload.to_string(),
            error: e.to_string(),
        }),
    }
}

/// Every `tool:` line of `text`, in order
pub fn parse(text: &str) -> Vec<ParsedCall> {
    let calls: Vec<ParsedCall> = text
        .lines()
        .filter_map(|line| match parse_line(line) {
            LineOutcome::Ignored => None,
            LineOutcome::Call(invocation) => Some(Ok(invocation)),
            LineOutcome::Malformed(call) => Some(Err(call)),
        })
        .collect();
    trace!("Parsed {} tool lines", calls.len());
    calls
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
