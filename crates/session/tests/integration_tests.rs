//! Integration tests for fsagent-session
//!
//! Covers the conversation lifecycle:
//! - ordering of appended messages
//! - tool results fed back as user messages
//! - windowing across a long session

use fsagent_provider::Role;
use fsagent_session::{format_tool_result, Conversation, DEFAULT_MAX_TURNS};
use serde::Serialize;

#[derive(Serialize)]
struct Outcome {
    success: bool,
    path: String,
}

#[test]
fn test_messages_keep_append_order() {
    let mut conversation = Conversation::new("sys");
    conversation.add_user("create notes.txt");
    conversation
        .add_tool_result(&Outcome {
            success: true,
            path: "/w/notes.txt".to_string(),
        })
        .unwrap();
    conversation.add_assistant("Created it.");

    let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::User, Role::Assistant]
    );
    assert_eq!(conversation.messages()[1].content, "create notes.txt");
    assert!(conversation.messages()[2]
        .content
        .starts_with("tool_result({"));
}

#[test]
fn test_format_tool_result_preserves_field_order() {
    let rendered = format_tool_result(&Outcome {
        success: false,
        path: "a.txt".to_string(),
    })
    .unwrap();

    assert_eq!(rendered, r#"tool_result({"success":false,"path":"a.txt"})"#);
}

#[test]
fn test_updated_at_advances() {
    let mut conversation = Conversation::new("sys");
    let created = conversation.created_at();

    conversation.add_user("hi");

    assert!(conversation.updated_at() >= created);
    assert_eq!(conversation.created_at(), created);
}

#[test]
fn test_long_session_window_is_stable() {
    let mut conversation = Conversation::new("sys");

    for turn in 0..50 {
        conversation.add_user(format!("question {}", turn));
        conversation.add_assistant(format!("answer {}", turn));

        let view = conversation.window(DEFAULT_MAX_TURNS);
        let expected = conversation.len().min(1 + 2 * DEFAULT_MAX_TURNS);

        assert_eq!(view.len(), expected);
        assert_eq!(view[0].role, Role::System);
        assert_eq!(view.last().unwrap().content, format!("answer {}", turn));
    }

    // Nothing was evicted from the log itself
    assert_eq!(conversation.len(), 101);
    assert_eq!(conversation.messages()[1].content, "question 0");
}

#[test]
fn test_window_never_duplicates_system() {
    let mut conversation = Conversation::new("sys");
    conversation.add_user("only message");

    let view = conversation.window(100);

    assert_eq!(view.len(), 2);
    assert_eq!(
        view.iter().filter(|m| m.role == Role::System).count(),
        1
    );
}
