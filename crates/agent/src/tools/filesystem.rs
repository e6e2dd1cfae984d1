//! Filesystem tools confined to a sandbox root

use std::path::Path;

use tracing::debug;

use super::{
    DirEntry, Diagnostics, EditDiagnostics, EntryKind, Sandbox, ToolCall, ToolError, ToolOutput,
    ToolResult,
};

/// The three file tools, bound to one sandbox
#[derive(Debug, Clone)]
pub struct Toolset {
    sandbox: Sandbox,
}

impl Toolset {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    /// Run a validated call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        match call {
            ToolCall::ReadFile { filename } => self.read_file(filename).await,
            ToolCall::ListFiles { path } => self.list_files(path).await,
            ToolCall::EditFile {
                path,
                old_str,
                new_str,
            } => self.edit_file(path, old_str, new_str).await,
        }
    }

    pub async fn read_file(&self, filename: &str) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(filename).await?;

        debug!("◆ READING: {:?}", path);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::io(&path, e))?;

        let diagnostics = Diagnostics::Read {
            byte_length: content.len(),
            line_count: content.lines().count(),
        };
        Ok(ToolResult {
            output: ToolOutput::Read {
                file_path: path.display().to_string(),
                content,
            },
            success: true,
            diagnostics,
        })
    }

    /// One level of entries, in whatever order the OS yields them
    pub async fn list_files(&self, path: &str) -> Result<ToolResult, ToolError> {
        let dir = self.sandbox.resolve(path).await?;

        debug!("◆ LISTING: {:?}", dir);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| ToolError::io(&dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ToolError::io(&dir, e))?
        {
            let is_dir = tokio::fs::metadata(entry.path())
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false);
            files.push(DirEntry {
                filename: entry.file_name().to_string_lossy().into_owned(),
                kind: if is_dir { EntryKind::Dir } else { EntryKind::File },
            });
        }

        let shown = dir.display().to_string();
        Ok(ToolResult {
            diagnostics: Diagnostics::List {
                count: files.len(),
                path: shown.clone(),
            },
            output: ToolOutput::List { path: shown, files },
            success: true,
        })
    }

    /// Create, overwrite, or replace the first occurrence of `old_str`.
    ///
    /// An empty `old_str` writes `new_str` as the whole file. The parent
    /// directory must already exist.
    pub async fn edit_file(
        &self,
        path: &str,
        old_str: &str,
        new_str: &str,
    ) -> Result<ToolResult, ToolError> {
        let path = self.sandbox.resolve(path).await?;
        let shown = path.display().to_string();

        if old_str.is_empty() {
            debug!("◆ WRITING: {:?} ({} bytes)", path, new_str.len());
            tokio::fs::write(&path, new_str)
                .await
                .map_err(|e| ToolError::Io {
                    path: path.clone(),
                    source: e,
                })?;
            return Ok(ToolResult {
                output: ToolOutput::Edit { path: shown },
                success: true,
                diagnostics: Diagnostics::Edit(EditDiagnostics::CreatedFile {
                    byte_length: new_str.len(),
                }),
            });
        }

        let original = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::io(&path, e))?;

        if !original.contains(old_str) {
            debug!("◆ NEEDLE NOT FOUND IN {:?}", path);
            return Ok(ToolResult {
                output: ToolOutput::Edit { path: shown },
                success: false,
                diagnostics: Diagnostics::Edit(EditDiagnostics::OldStrNotFound {
                    needle: old_str.to_string(),
                }),
            });
        }

        let edited = original.replacen(old_str, new_str, 1);
        debug!("◆ EDITING: {:?}", path);
        tokio::fs::write(&path, &edited)
            .await
            .map_err(|e| ToolError::io(&path, e))?;

        Ok(ToolResult {
            output: ToolOutput::Edit { path: shown },
            success: true,
            diagnostics: Diagnostics::Edit(EditDiagnostics::Edited {
                original_length: original.chars().count(),
                edited_length: edited.chars().count(),
            }),
        })
    }
}
