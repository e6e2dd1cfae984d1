//! Tools the model can invoke
//!
//! The tool set is closed: three known tools plus `Unknown` for anything the
//! model made up. A parsed invocation is validated into a [`ToolCall`] and
//! dispatched by `match` in [`Toolset::execute`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::parser::{MalformedCall, ToolInvocation};

pub mod filesystem;
pub mod sandbox;

pub use filesystem::Toolset;
pub use sandbox::{Sandbox, SandboxError};

/// Tool names known to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    ReadFile,
    ListFiles,
    EditFile,
    Unknown(String),
}

impl ToolKind {
    pub const KNOWN: [ToolKind; 3] = [ToolKind::ReadFile, ToolKind::ListFiles, ToolKind::EditFile];

    pub fn from_name(name: &str) -> Self {
        match name {
            "read_file" => ToolKind::ReadFile,
            "list_files" => ToolKind::ListFiles,
            "edit_file" => ToolKind::EditFile,
            other => ToolKind::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolKind::ReadFile => "read_file",
            ToolKind::ListFiles => "list_files",
            ToolKind::EditFile => "edit_file",
            ToolKind::Unknown(name) => name,
        }
    }

    /// Argument keys that must be present, all string-valued
    pub fn required_args(&self) -> &'static [&'static str] {
        match self {
            ToolKind::ReadFile => &["filename"],
            ToolKind::ListFiles => &["path"],
            ToolKind::EditFile => &["path", "old_str", "new_str"],
            ToolKind::Unknown(_) => &[],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::ReadFile => "Read the full contents of a file",
            ToolKind::ListFiles => "List the entries of a directory (one level)",
            ToolKind::EditFile => {
                "Replace the first occurrence of old_str with new_str; an empty old_str creates or overwrites the file with new_str"
            }
            ToolKind::Unknown(_) => "",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reasons an invocation cannot become a [`ToolCall`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{tool} is missing arguments: {}", .missing.join(", "))]
    MissingArguments { tool: String, missing: Vec<String> },

    #[error("{tool} argument {key} must be a string")]
    NotAString { tool: String, key: String },
}

/// A validated tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ReadFile {
        filename: String,
    },
    ListFiles {
        path: String,
    },
    EditFile {
        path: String,
        old_str: String,
        new_str: String,
    },
}

impl ToolCall {
    /// Check the name and required string arguments of an invocation
    pub fn from_invocation(invocation: &ToolInvocation) -> Result<Self, ValidationError> {
        let kind = ToolKind::from_name(&invocation.tool_name);
        if let ToolKind::Unknown(name) = &kind {
            return Err(ValidationError::UnknownTool(name.clone()));
        }

        let missing: Vec<String> = kind
            .required_args()
            .iter()
            .filter(|key| !invocation.args.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingArguments {
                tool: kind.name().to_string(),
                missing,
            });
        }

        let arg = |key: &str| string_arg(&kind, &invocation.args, key);
        Ok(match &kind {
            ToolKind::ReadFile => ToolCall::ReadFile {
                filename: arg("filename")?,
            },
            ToolKind::ListFiles => ToolCall::ListFiles { path: arg("path")? },
            ToolKind::EditFile => ToolCall::EditFile {
                path: arg("path")?,
                old_str: arg("old_str")?,
                new_str: arg("new_str")?,
            },
            ToolKind::Unknown(name) => return Err(ValidationError::UnknownTool(name.clone())),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::ReadFile { .. } => ToolKind::ReadFile,
            ToolCall::ListFiles { .. } => ToolKind::ListFiles,
            ToolCall::EditFile { .. } => ToolKind::EditFile,
        }
    }
}

fn string_arg(kind: &ToolKind, args: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    match args.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ValidationError::NotAString {
            tool: kind.name().to_string(),
            key: key.to_string(),
        }),
        None => Err(ValidationError::MissingArguments {
            tool: kind.name().to_string(),
            missing: vec![key.to_string()],
        }),
    }
}

/// Faults while executing a validated call
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ToolError::NotFound(path.to_path_buf())
        } else {
            ToolError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Tool-specific payload of a result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Read { file_path: String, content: String },
    List { path: String, files: Vec<DirEntry> },
    Edit { path: String },
}

/// What happened during an edit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditDiagnostics {
    CreatedFile {
        byte_length: usize,
    },
    OldStrNotFound {
        needle: String,
    },
    Edited {
        original_length: usize,
        edited_length: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Diagnostics {
    Read { byte_length: usize, line_count: usize },
    List { count: usize, path: String },
    Edit(EditDiagnostics),
}

/// Outcome of a tool that ran to completion.
///
/// `success` can still be false: an edit whose `old_str` is absent is an
/// ordinary result the model is expected to react to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    #[serde(flatten)]
    pub output: ToolOutput,
    pub success: bool,
    pub diagnostics: Diagnostics,
}

/// Payload fed back when a call could not run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolFailure {
    pub success: bool,
    pub error: String,
    pub tool: String,
    pub args: Value,
}

impl ToolFailure {
    pub fn new(invocation: &ToolInvocation, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
            tool: invocation.tool_name.clone(),
            args: Value::Object(invocation.args.clone()),
        }
    }

    /// A call whose argument payload did not parse; the raw text is echoed back
    pub fn malformed(call: &MalformedCall) -> Self {
        Self {
            success: false,
            error: call.to_string(),
            tool: call.tool_name.clone(),
            args: Value::String(call.payload.clone()),
        }
    }
}
