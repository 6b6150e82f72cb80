//! Anthropic Messages API adapter, used for the engineer cortex (§4.2).
//!
//! System messages go in a separate top-level `system` field per the
//! Anthropic wire format; everything else is a `user`/`assistant` turn.

use crate::traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};
use alex_domain::tool::{Role, ToolCall, ToolDefinition};
use alex_domain::{Error, Result};
use serde_json::Value;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn from_env(default_model: impl Into<String>) -> Result<Self> {
        let api_key = resolve_api_key("ANTHROPIC_API_KEY")?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key,
            default_model: default_model.into(),
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());

        let mut system_parts: Vec<String> = Vec::new();
        let mut messages: Vec<Value> = Vec::new();

        for msg in &req.messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.clone()),
                Role::User => messages.push(serde_json::json!({"role": "user", "content": msg.content})),
                Role::Assistant => messages.push(serde_json::json!({"role": "assistant", "content": msg.content})),
                Role::Tool => messages.push(serde_json::json!({
                    "role": "user",
                    "content": [{"type": "tool_result", "content": msg.content}],
                })),
            }
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": req.max_tokens.unwrap_or(4096),
        });

        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n\n"));
        }
        if let Some(t) = req.temperature {
            body["temperature"] = serde_json::json!(t);
        }
        if !req.tools.is_empty() {
            body["tools"] = serde_json::json!(req.tools.iter().map(tool_to_anthropic).collect::<Vec<_>>());
        }

        body
    }
}

fn tool_to_anthropic(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "input_schema": tool.parameters,
    })
}

fn parse_response(body: &Value, model: &str) -> Result<ChatResponse> {
    let content = body.get("content").and_then(|v| v.as_array()).ok_or_else(|| Error::Provider {
        provider: "anthropic".into(),
        message: "missing content array in response".into(),
    })?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in content {
        match block.get("type").and_then(|v| v.as_str()) {
            Some("text") => {
                if let Some(t) = block.get("text").and_then(|v| v.as_str()) {
                    text.push_str(t);
                }
            }
            Some("tool_use") => {
                tool_calls.push(ToolCall {
                    call_id: block.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    tool_name: block.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    arguments: block.get("input").cloned().unwrap_or(Value::Object(Default::default())),
                });
            }
            _ => {}
        }
    }

    let finish_reason = body.get("stop_reason").and_then(|v| v.as_str()).map(|s| s.to_string());

    Ok(ChatResponse { content: text, tool_calls, model: model.to_string(), finish_reason })
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());
        let body = self.build_body(&req);
        let resp = self
            .authed_post(&format!("{}/v1/messages", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider { provider: "anthropic".into(), message: format!("{status}: {text}") });
        }

        let value: Value = resp.json().await.map_err(from_reqwest)?;
        parse_response(&value, &model)
    }

    async fn chat_with_tools(&self, req: ChatRequest) -> Result<ChatResponse> {
        self.chat(req).await
    }

    async fn embed(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        Err(Error::Provider { provider: "anthropic".into(), message: "embeddings not supported".into() })
    }

    fn provider_id(&self) -> &str {
        "anthropic"
    }
}
