//! Common test utilities for fsagent integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// An isolated HOME plus a sandbox directory to point the agent at
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub workspace_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let workspace_dir = temp_dir.path().join("workspace");
        std::fs::create_dir_all(&workspace_dir)?;

        Ok(Self {
            temp_dir,
            workspace_dir,
        })
    }

    pub fn workspace_file(&self, name: &str) -> PathBuf {
        self.workspace_dir.join(name)
    }

    /// A command with no provider, key or workdir inherited from the caller
    pub fn bare_command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_fsagent"));
        cmd.env("HOME", self.temp_dir.path())
            .env_remove("AGENT_PROVIDER")
            .env_remove("AGENT_WORKDIR")
            .env_remove("GLM_API_KEY")
            .env_remove("DEEPSEEK_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    /// A command configured for deepseek against `base_url`, rooted in the workspace
    pub fn command(&self, base_url: &str) -> Command {
        let mut cmd = self.bare_command();
        cmd.env("DEEPSEEK_API_KEY", "test-key")
            .arg("--provider")
            .arg("deepseek")
            .arg("--workdir")
            .arg(&self.workspace_dir)
            .arg("--base-url")
            .arg(base_url);
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

/// An OpenAI-style completion body whose message content is `content`
pub fn completion(content: &str) -> String {
    serde_json::json!({
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2 }
    })
    .to_string()
}
