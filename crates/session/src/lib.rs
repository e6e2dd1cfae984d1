//! Conversation store
//!
//! An append-only, in-memory log of role-tagged messages. The first entry is
//! always the system prompt. What gets sent to the model is a windowed
//! projection of the log; the log itself is never trimmed.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::trace;

use fsagent_provider::{Message, Role};

/// Default number of trailing turns included in a window
pub const DEFAULT_MAX_TURNS: usize = 10;

/// Prefix of the user-role message carrying a tool outcome back to the model
pub const TOOL_RESULT_PREFIX: &str = "tool_result(";

/// Render a tool outcome in the `tool_result({...})` wire form
pub fn format_tool_result<T: Serialize>(result: &T) -> serde_json::Result<String> {
    Ok(format!("{}{})", TOOL_RESULT_PREFIX, serde_json::to_string(result)?))
}

/// The session's conversation log
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    created_at: DateTime<Local>,
    updated_at: DateTime<Local>,
}

impl Conversation {
    /// Start a conversation whose first message is `system_prompt`
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            messages: vec![Message::system(system_prompt)],
            created_at: now,
            updated_at: now,
        }
    }

    fn push(&mut self, message: Message) {
        trace!(
            "Conversation +{} ({} bytes), now {} messages",
            message.role,
            message.content.len(),
            self.messages.len() + 1
        );
        self.messages.push(message);
        self.updated_at = Local::now();
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// Append a tool outcome as a user-role `tool_result(...)` message
    pub fn add_tool_result<T: Serialize>(&mut self, result: &T) -> serde_json::Result<()> {
        let content = format_tool_result(result)?;
        self.push(Message::user(content));
        Ok(())
    }

    /// The system prompt (message 0)
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    /// Every message, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true: the system prompt is always present
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages with the given role
    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Local> {
        self.updated_at
    }

    /// The view sent to the model: the system prompt followed by at most
    /// `2 * max_turns` of the most recent other messages.
    pub fn window(&self, max_turns: usize) -> Vec<Message> {
        let rest = &self.messages[1..];
        let keep = rest.len().min(max_turns.saturating_mul(2));
        let mut view = Vec::with_capacity(keep + 1);
        view.push(self.messages[0].clone());
        view.extend_from_slice(&rest[rest.len() - keep..]);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conversation_with(n: usize) -> Conversation {
        let mut conversation = Conversation::new("system prompt");
        for i in 0..n {
            if i % 2 == 0 {
                conversation.add_user(format!("user {}", i));
            } else {
                conversation.add_assistant(format!("assistant {}", i));
            }
        }
        conversation
    }

    #[test]
    fn test_new_starts_with_system() {
        let conversation = Conversation::new("be helpful");
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.is_empty());
        assert_eq!(conversation.system().role, Role::System);
        assert_eq!(conversation.system().content, "be helpful");
        assert_eq!(conversation.created_at(), conversation.updated_at());
    }

    #[test]
    fn test_window_short_conversation_is_whole_log() {
        let conversation = conversation_with(4);
        assert_eq!(conversation.window(10), conversation.messages().to_vec());
    }

    #[test]
    fn test_window_length_is_bounded() {
        for max_turns in 0..5 {
            for extra in 1..6 {
                let len = 1 + 2 * max_turns + extra;
                let conversation = conversation_with(len - 1);
                let view = conversation.window(max_turns);

                assert_eq!(view.len(), 1 + 2 * max_turns, "L={} m={}", len, max_turns);
                assert_eq!(view[0], conversation.messages()[0]);
                if max_turns > 0 {
                    assert_eq!(view.last(), conversation.last());
                } else {
                    assert_eq!(view.last(), Some(conversation.system()));
                }
            }
        }
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let conversation = conversation_with(30);
        let view = conversation.window(DEFAULT_MAX_TURNS);

        assert_eq!(view.len(), 21);
        assert_eq!(view[1].content, "user 10");
        assert_eq!(view[20].content, "assistant 29");
    }

    #[test]
    fn test_window_zero_turns_is_system_only() {
        let conversation = conversation_with(3);
        let view = conversation.window(0);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].role, Role::System);
    }

    #[test]
    fn test_window_does_not_mutate_log() {
        let conversation = conversation_with(25);
        let _ = conversation.window(2);
        assert_eq!(conversation.len(), 26);
    }

    #[test]
    fn test_add_tool_result_wire_form() {
        let mut conversation = Conversation::new("sys");
        conversation
            .add_tool_result(&json!({"success": true}))
            .unwrap();

        let last = conversation.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, r#"tool_result({"success":true})"#);
        assert_eq!(conversation.count_role(Role::User), 1);
    }
}
