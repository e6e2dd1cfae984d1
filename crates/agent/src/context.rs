//! System prompt assembly

use std::path::{Path, PathBuf};

use crate::parser::TOOL_PREFIX;
use crate::tools::ToolKind;
use fsagent_session::TOOL_RESULT_PREFIX;

/// Builds the system prompt for a sandbox root
pub struct ContextBuilder {
    workspace: PathBuf,
}

impl ContextBuilder {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }

    pub fn build_system_prompt(&self) -> String {
        format!(
            r#"You are a coding assistant working inside the directory {workspace}.
You can use these tools:
{tools}

To use a tool, reply with one line per call, exactly in this form:
{prefix} TOOL_NAME({{"key": "value"}})

Arguments are a JSON object whose values are strings. You may put several calls in one reply; they run in order and stop at the first failure.
Each result comes back to you as a message of the form {result_prefix}{{...}}). After reading the results, continue the task.
Paths are relative to {workspace}; paths that lead outside it are rejected.
To create a file, call edit_file with an empty old_str.
When you are finished, reply in plain text without any tool calls."#,
            workspace = self.workspace.display(),
            tools = self.tool_list(),
            prefix = TOOL_PREFIX,
            result_prefix = TOOL_RESULT_PREFIX,
        )
    }

    fn tool_list(&self) -> String {
        ToolKind::KNOWN
            .iter()
            .map(|kind| {
                let args: Vec<String> = kind
                    .required_args()
                    .iter()
                    .map(|arg| format!("{}: str", arg))
                    .collect();
                format!("- {}({}): {}", kind.name(), args.join(", "), kind.description())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_list_signatures() {
        let list = ContextBuilder::new("/w").tool_list();
        let lines: Vec<&str> = list.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("- read_file(filename: str): "));
        assert!(lines[1].starts_with("- list_files(path: str): "));
        assert!(lines[2].starts_with("- edit_file(path: str, old_str: str, new_str: str): "));
    }
}
