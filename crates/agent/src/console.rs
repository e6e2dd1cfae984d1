//! The interactive channel between the user and the loop

use async_trait::async_trait;

/// Something the loop wants the user to see
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The model's final answer for this turn
    Reply(String),
    /// A tool ran; `success` mirrors the result payload
    ToolCompleted { tool: String, success: bool },
    /// A call could not run and the rest of its batch was dropped
    ToolFailure { tool: String, error: String },
    ProviderFailure(String),
    /// The per-turn model call budget ran out
    IterationLimit(u32),
}

#[async_trait]
pub trait Console: Send {
    /// Next line from the user; `None` once input is closed or interrupted
    async fn read_input(&mut self) -> std::io::Result<Option<String>>;

    fn present(&mut self, event: &TurnEvent);
}
