//! OpenAI-compatible chat completions client
//!
//! Both supported providers (GLM and DeepSeek) speak this protocol; only the
//! base URL, key and model differ.

use crate::*;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, trace};

/// Chat completions over HTTP
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, params: &ChatParams) -> Value {
        let messages: Vec<Value> = params
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": &m.content }))
            .collect();

        json!({
            "model": &params.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        })
    }

    fn parse_response(&self, json: Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let content = choice["message"]["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let usage = match json["usage"].as_object() {
            Some(usage) => {
                let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0) as u32;
                Usage {
                    prompt_tokens: count("prompt_tokens"),
                    completion_tokens: count("completion_tokens"),
                    total_tokens: count("total_tokens"),
                }
            }
            None => Usage::default(),
        };

        Ok(ChatResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        let url = self.endpoint();
        trace!("◆ UPLINK TO {}", url);

        let body = self.build_request(&params);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ProviderError::Api(message));
        }

        let json: Value = serde_json::from_str(&text)?;
        let response = self.parse_response(json)?;
        debug!(
            "◆ COMPLETION: finish={} tokens={}",
            response.finish_reason, response.usage.total_tokens
        );
        Ok(response)
    }
}
