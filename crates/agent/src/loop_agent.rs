//! Agent loop - core processing engine
//!
//! Alternates between the model and the tools until the model answers in
//! plain text, then waits for the next user line.

use std::path::Path;

use tracing::{debug, error, info, warn};

use fsagent_config::{AgentSettings, LlmConfig};
use fsagent_provider::{ChatParams, Provider};
use fsagent_session::Conversation;

use crate::console::{Console, TurnEvent};
use crate::context::ContextBuilder;
use crate::parser::{self, ParsedCall};
use crate::tools::{Sandbox, ToolCall, ToolFailure, ToolResult, Toolset};
use crate::Result;

/// Where the loop is
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingUserInput,
    /// `iteration` counts model calls within the current user turn, from 1
    ModelTurn { iteration: u32 },
    Dispatching { iteration: u32, batch: Vec<ParsedCall> },
    Closed,
}

/// Owns the conversation and the tools; one model request or tool call at a
/// time.
pub struct AgentLoop<P: Provider> {
    provider: P,
    toolset: Toolset,
    conversation: Conversation,
    model: String,
    temperature: f64,
    max_tokens: u32,
    max_history_turns: usize,
    max_iterations: u32,
}

impl<P: Provider> AgentLoop<P> {
    /// Create a new agent loop with default limits
    pub fn new(provider: P, llm: &LlmConfig, workdir: impl AsRef<Path>) -> Result<Self> {
        Self::with_settings(provider, llm, workdir, &AgentSettings::default())
    }

    pub fn with_settings(
        provider: P,
        llm: &LlmConfig,
        workdir: impl AsRef<Path>,
        settings: &AgentSettings,
    ) -> Result<Self> {
        let sandbox = Sandbox::new(workdir)?;
        let system_prompt = ContextBuilder::new(sandbox.root()).build_system_prompt();

        info!(
            "◆ AGENT ONLINE: provider={} model={} root={:?}",
            llm.provider,
            llm.model,
            sandbox.root()
        );

        Ok(Self {
            provider,
            toolset: Toolset::new(sandbox),
            conversation: Conversation::new(system_prompt),
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            max_history_turns: settings.max_history_turns,
            max_iterations: settings.max_tool_iterations,
        })
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn toolset(&self) -> &Toolset {
        &self.toolset
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Read and answer user input until the console closes
    pub async fn run<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<()> {
        let mut state = LoopState::AwaitingUserInput;
        while state != LoopState::Closed {
            state = self.step(state, console).await?;
        }
        info!(
            "◆ SESSION CLOSED after {} messages",
            self.conversation.len()
        );
        Ok(())
    }

    /// Run one complete user turn for `input`
    pub async fn process_input<C: Console + ?Sized>(
        &mut self,
        input: &str,
        console: &mut C,
    ) -> Result<()> {
        let Some(mut state) = self.begin_turn(input) else {
            return Ok(());
        };
        while state != LoopState::AwaitingUserInput {
            state = self.step(state, console).await?;
        }
        Ok(())
    }

    async fn step<C: Console + ?Sized>(
        &mut self,
        state: LoopState,
        console: &mut C,
    ) -> Result<LoopState> {
        Ok(match state {
            LoopState::AwaitingUserInput => match console.read_input().await? {
                None => LoopState::Closed,
                Some(line) => self
                    .begin_turn(&line)
                    .unwrap_or(LoopState::AwaitingUserInput),
            },
            LoopState::ModelTurn { iteration } => self.model_turn(iteration, console).await,
            LoopState::Dispatching { iteration, batch } => {
                self.dispatch(batch, console).await?;
                LoopState::ModelTurn {
                    iteration: iteration + 1,
                }
            }
            LoopState::Closed => LoopState::Closed,
        })
    }

    /// Record the user's line; blank input starts nothing
    fn begin_turn(&mut self, input: &str) -> Option<LoopState> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        debug!("◆ USER TURN: {} chars", input.len());
        self.conversation.add_user(input);
        Some(LoopState::ModelTurn { iteration: 1 })
    }

    async fn model_turn<C: Console + ?Sized>(&mut self, iteration: u32, console: &mut C) -> LoopState {
        if iteration > self.max_iterations {
            warn!("◆ ITERATION LIMIT REACHED ({})", self.max_iterations);
            console.present(&TurnEvent::IterationLimit(self.max_iterations));
            return LoopState::AwaitingUserInput;
        }

        let params = ChatParams {
            model: self.model.clone(),
            messages: self.conversation.window(self.max_history_turns),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        debug!(
            "◆ MODEL CALL {}/{} with {} messages",
            iteration,
            self.max_iterations,
            params.messages.len()
        );

        let response = match self.provider.chat(params).await {
            Ok(response) => response,
            Err(e) => {
                error!("◆ PROVIDER FAILURE: {}", e);
                console.present(&TurnEvent::ProviderFailure(e.to_string()));
                return LoopState::AwaitingUserInput;
            }
        };

        let text = response.content_or_empty().to_string();
        let batch = parser::parse(&text);
        if batch.is_empty() {
            self.conversation.add_assistant(text.clone());
            console.present(&TurnEvent::Reply(text));
            return LoopState::AwaitingUserInput;
        }

        debug!("◆ {} TOOL CALLS QUEUED", batch.len());
        LoopState::Dispatching { iteration, batch }
    }

    /// Execute a batch in order, stopping at the first call that cannot run
    async fn dispatch<C: Console + ?Sized>(
        &mut self,
        batch: Vec<ParsedCall>,
        console: &mut C,
    ) -> Result<()> {
        for parsed in batch {
            match self.execute(parsed).await {
                Ok((tool, result)) => {
                    self.conversation.add_tool_result(&result)?;
                    console.present(&TurnEvent::ToolCompleted {
                        tool,
                        success: result.success,
                    });
                }
                Err(failure) => {
                    warn!("◆ TOOL FAILED: {} - {}", failure.tool, failure.error);
                    self.conversation.add_tool_result(&failure)?;
                    console.present(&TurnEvent::ToolFailure {
                        tool: failure.tool,
                        error: failure.error,
                    });
                    break;
                }
            }
        }
        Ok(())
    }

    async fn execute(
        &self,
        parsed: ParsedCall,
    ) -> std::result::Result<(String, ToolResult), ToolFailure> {
        let invocation = parsed.map_err(|call| ToolFailure::malformed(&call))?;
        let call = ToolCall::from_invocation(&invocation)
            .map_err(|e| ToolFailure::new(&invocation, e))?;

        debug!("◆ EXECUTING {}", call.kind());
        let result = self
            .toolset
            .execute(&call)
            .await
            .map_err(|e| ToolFailure::new(&invocation, e))?;
        Ok((invocation.tool_name, result))
    }
}
