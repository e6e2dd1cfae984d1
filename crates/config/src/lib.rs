//! Configuration for fsagent
//!
//! Turns a provider name, the process environment and an optional settings
//! file into the values the agent core consumes: an [`LlmConfig`] and a
//! sandbox root directory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir, expand_tilde};

/// Environment variable naming the provider when `--provider` is absent
pub const PROVIDER_ENV: &str = "AGENT_PROVIDER";

/// Environment variable naming the sandbox root when `--workdir` is absent
pub const WORKDIR_ENV: &str = "AGENT_WORKDIR";

/// Errors in configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DATA LINK ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("SETTINGS UNREADABLE: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NO PROVIDER: pass --provider or set AGENT_PROVIDER (glm4.7 or deepseek)")]
    MissingProvider,

    #[error("UNSUPPORTED PROVIDER: {0}")]
    UnsupportedProvider(String),

    #[error("MISSING API KEY: environment variable {var} is not set")]
    MissingApiKey { var: &'static str },

    #[error("WORKDIR NOT FOUND: {0}")]
    WorkdirNotFound(PathBuf),

    #[error("WORKDIR IS NOT A DIRECTORY: {0}")]
    NotADirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Glm47,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Glm47, ProviderKind::DeepSeek];

    /// Canonical lowercase name, as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Glm47 => "glm4.7",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Glm47 => "GLM_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Glm47 => "glm-4-7",
            ProviderKind::DeepSeek => "deepseek-chat",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            ProviderKind::Glm47 => "https://open.bigmodel.cn/api/paas/v4/",
            ProviderKind::DeepSeek => "https://api.deepseek.com",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or(ConfigError::UnsupportedProvider(lower))
    }
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    600
}

/// Connection and sampling parameters for the LLM service
#[derive(Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Build the table defaults for `kind` with an explicit key
    pub fn for_provider(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider: kind.name().to_string(),
            api_key: api_key.into(),
            model: kind.default_model().to_string(),
            base_url: kind.base_url().to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    /// Build from a provider name, reading its API key from the environment
    pub fn from_env(provider: &str) -> Result<Self> {
        let kind: ProviderKind = provider.parse()?;
        let var = kind.api_key_env();
        let api_key = std::env::var(var)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey { var })?;
        debug!("◆ PROVIDER {} KEYED FROM {}", kind, var);
        Ok(Self::for_provider(kind, api_key))
    }

    /// Apply settings-file overrides on top of the table defaults
    pub fn apply(&mut self, overrides: &LlmOverrides) {
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(base_url) = &overrides.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = max_tokens;
        }
    }
}

/// Pick the provider name from the flag or `AGENT_PROVIDER`; a blank flag
/// counts as absent.
pub fn resolve_provider(flag: Option<String>) -> Result<String> {
    let non_blank = |p: String| Some(p.trim().to_string()).filter(|p| !p.is_empty());
    flag.and_then(non_blank)
        .or_else(|| std::env::var(PROVIDER_ENV).ok().and_then(non_blank))
        .ok_or(ConfigError::MissingProvider)
}

/// Resolve the sandbox root from the flag, `AGENT_WORKDIR`, or the current
/// directory, in that order.
///
/// The result is absolute and canonical, and is guaranteed to be an existing
/// directory.
pub fn resolve_workdir(flag: Option<&str>) -> Result<PathBuf> {
    let candidate = flag
        .map(str::to_string)
        .or_else(|| std::env::var(WORKDIR_ENV).ok())
        .filter(|p| !p.is_empty());

    let base = match candidate {
        Some(path) => expand_tilde(&path),
        None => std::env::current_dir()?,
    };
    let absolute = if base.is_absolute() {
        base
    } else {
        std::env::current_dir()?.join(base)
    };

    let resolved = match std::fs::canonicalize(&absolute) {
        Ok(path) => path,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::WorkdirNotFound(absolute));
        }
        Err(e) => return Err(e.into()),
    };
    if !resolved.is_dir() {
        return Err(ConfigError::NotADirectory(resolved));
    }
    Ok(resolved)
}

fn default_max_history_turns() -> usize {
    10
}

fn default_max_tool_iterations() -> u32 {
    20
}

/// Orchestrator limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    /// Trailing user/assistant turn pairs sent to the model
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    /// Model calls allowed per user turn
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

/// Optional overrides of the provider table
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LlmOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Root of the settings file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub llm: LlmOverrides,
}

impl Settings {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        Self::load_from(&config_path()).await
    }

    /// Load from a specific location; a missing file yields the defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ NO SETTINGS AT {:?}, USING DEFAULTS", path);
            return Ok(Settings::default());
        }

        debug!("◆ READING SETTINGS FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse_case_insensitive() {
        assert_eq!("deepseek".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert_eq!("DeepSeek".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert_eq!(" GLM4.7 ".parse::<ProviderKind>().unwrap(), ProviderKind::Glm47);
    }

    #[test]
    fn test_provider_kind_parse_unknown() {
        let err = "openai".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(ref p) if p == "openai"));
    }

    #[test]
    fn test_for_provider_table_values() {
        let config = LlmConfig::for_provider(ProviderKind::Glm47, "k");
        assert_eq!(config.provider, "glm4.7");
        assert_eq!(config.model, "glm-4-7");
        assert_eq!(config.base_url, "https://open.bigmodel.cn/api/paas/v4/");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 600);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = LlmConfig::for_provider(ProviderKind::DeepSeek, "sk-secret");
        let shown = format!("{:?}", config);
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("REDACTED"));
    }

    #[test]
    fn test_apply_overrides_partial() {
        let mut config = LlmConfig::for_provider(ProviderKind::DeepSeek, "k");
        config.apply(&LlmOverrides {
            model: Some("deepseek-reasoner".to_string()),
            max_tokens: Some(2048),
            ..Default::default()
        });
        assert_eq!(config.model, "deepseek-reasoner");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.base_url, "https://api.deepseek.com");
        assert_eq!(config.temperature, 0.2);
    }
}
