//! Command implementations

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use fsagent_agent::{AgentLoop, Console, TurnEvent};
use fsagent_config::{resolve_provider, resolve_workdir, LlmConfig, Settings};
use fsagent_provider::OpenAiCompatProvider;

const USER_COLOR: &str = "\u{1b}[94m";
const ASSISTANT_COLOR: &str = "\u{1b}[93m";
const RESET_COLOR: &str = "\u{1b}[0m";

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// LLM provider: glm4.7 or deepseek [env: AGENT_PROVIDER]
    #[arg(long)]
    pub provider: Option<String>,

    /// Directory the agent may touch [env: AGENT_WORKDIR, default: current directory]
    #[arg(long)]
    pub workdir: Option<String>,

    /// Settings file [default: ~/.fsagent/config.json]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model name, overriding the provider default
    #[arg(long)]
    pub model: Option<String>,

    /// API base URL, overriding the provider default
    #[arg(long)]
    pub base_url: Option<String>,

    /// Conversation turns sent to the model with each request
    #[arg(long)]
    pub max_turns: Option<usize>,

    /// Model calls allowed per user message
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Send one message and exit
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Chat with the agent
pub async fn chat_command(args: ChatArgs) -> Result<()> {
    let provider_name = resolve_provider(args.provider.clone())?;
    let mut llm = LlmConfig::from_env(&provider_name)?;
    let workdir = resolve_workdir(args.workdir.as_deref())?;

    let settings = match &args.config {
        Some(path) => Settings::load_from(path).await,
        None => Settings::load().await,
    }
    .context("failed to load settings")?;

    llm.apply(&settings.llm);
    if let Some(model) = args.model {
        llm.model = model;
    }
    if let Some(base_url) = args.base_url {
        llm.base_url = base_url;
    }

    let mut limits = settings.agent;
    if let Some(turns) = args.max_turns {
        limits.max_history_turns = turns;
    }
    if let Some(iterations) = args.max_iterations {
        limits.max_tool_iterations = iterations;
    }
    debug!("◆ CONFIG: {:?} {:?}", llm, limits);

    let provider = OpenAiCompatProvider::new(llm.api_key.clone(), llm.base_url.clone());
    let mut agent = AgentLoop::with_settings(provider, &llm, &workdir, &limits)
        .context("failed to start agent")?;
    let mut console = TerminalConsole::new();

    if let Some(message) = args.message {
        agent.process_input(&message, &mut console).await?;
    } else {
        println!(
            "◆ {} ({}) in {}",
            llm.provider,
            llm.model,
            agent.toolset().root().display()
        );
        println!("◆ Ctrl-C or Ctrl-D to quit");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        agent.run(&mut console).await?;
    }

    info!("◆ DISENGAGED");
    Ok(())
}

/// Colored prompt/response transcript on stdout, input from stdin
pub struct TerminalConsole {
    lines: Lines<BufReader<Stdin>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

fn assistant(text: impl std::fmt::Display) {
    println!("{}Assistant:{} {}", ASSISTANT_COLOR, RESET_COLOR, text);
}

#[async_trait]
impl Console for TerminalConsole {
    async fn read_input(&mut self) -> std::io::Result<Option<String>> {
        print!("{}You:{} ", USER_COLOR, RESET_COLOR);
        std::io::stdout().flush()?;

        tokio::select! {
            line = self.lines.next_line() => {
                let line = line?;
                if line.is_none() {
                    println!();
                }
                Ok(line)
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                Ok(None)
            }
        }
    }

    fn present(&mut self, event: &TurnEvent) {
        match event {
            TurnEvent::Reply(text) => assistant(text),
            TurnEvent::ToolCompleted { tool, success: true } => assistant(format!("◆ {}", tool)),
            TurnEvent::ToolCompleted {
                tool,
                success: false,
            } => assistant(format!("◆ {} (no change)", tool)),
            TurnEvent::ToolFailure { tool, error } => {
                assistant(format!("◆ {} failed: {}", tool, error))
            }
            TurnEvent::ProviderFailure(message) => {
                assistant(format!("◆ model request failed: {}", message))
            }
            TurnEvent::IterationLimit(limit) => assistant(format!(
                "◆ stopped after {} model calls; send another message to continue",
                limit
            )),
        }
    }
}
