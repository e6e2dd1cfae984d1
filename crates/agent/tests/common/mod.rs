//! Shared fixtures for agent loop tests

#![allow(dead_code)]

use async_trait::async_trait;
use fsagent_agent::{Console, TurnEvent};
use fsagent_config::{LlmConfig, ProviderKind};
use fsagent_provider::{ChatParams, ChatResponse, Provider, ProviderError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned replies in order and records every request it receives
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Arc<Mutex<Vec<ChatParams>>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a provider error after the replies already scripted
    pub fn then_fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn then_reply(self, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<ChatParams>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(params);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(ChatResponse::text(text)),
            Some(Err(message)) => Err(ProviderError::Api(message)),
            None => Err(ProviderError::Api("script exhausted".to_string())),
        }
    }
}

/// Feeds scripted input lines and keeps every presented event
#[derive(Default)]
pub struct RecordingConsole {
    inputs: VecDeque<String>,
    pub events: Vec<TurnEvent>,
}

impl RecordingConsole {
    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            events: Vec::new(),
        }
    }

    pub fn replies(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                TurnEvent::Reply(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Console for RecordingConsole {
    async fn read_input(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }

    fn present(&mut self, event: &TurnEvent) {
        self.events.push(event.clone());
    }
}

pub fn llm_config() -> LlmConfig {
    LlmConfig::for_provider(ProviderKind::DeepSeek, "test-key")
}
