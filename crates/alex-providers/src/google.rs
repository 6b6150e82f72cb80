//! Google Gemini adapter — `generateContent` and `embedContent`.
//!
//! Auth is an API key passed as the `key` query parameter, matching the
//! Gemini REST API (grounded on the teacher's Gemini adapter, simplified to
//! our non-streaming request/response contract).

use crate::traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};
use alex_domain::tool::{Role, ToolCall, ToolDefinition};
use alex_domain::{Error, Result};
use serde_json::Value;

pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn from_env(default_model: impl Into<String>) -> Result<Self> {
        let api_key = resolve_api_key("GOOGLE_API_KEY")?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            default_model: default_model.into(),
            client,
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent?key={}", self.base_url, model, self.api_key)
    }

    fn embed_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:embedContent?key={}", self.base_url, model, self.api_key)
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        let mut system_instruction: Option<Value> = None;

        for msg in &req.messages {
            match msg.role {
                Role::System => {
                    system_instruction = Some(serde_json::json!({"parts": [{"text": msg.content}]}));
                }
                Role::User => {
                    contents.push(serde_json::json!({"role": "user", "parts": [{"text": msg.content}]}));
                }
                Role::Assistant => {
                    contents.push(serde_json::json!({"role": "model", "parts": [{"text": msg.content}]}));
                }
                Role::Tool => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{"functionResponse": {"name": "tool", "response": {"content": msg.content}}}]
                    }));
                }
            }
        }

        let mut body = serde_json::json!({ "contents": contents });
        if let Some(si) = system_instruction {
            body["systemInstruction"] = si;
        }
        if !req.tools.is_empty() {
            body["tools"] = serde_json::json!([{ "functionDeclarations": req.tools.iter().map(tool_to_gemini).collect::<Vec<_>>() }]);
        }

        let mut gen_config = serde_json::json!({});
        if let Some(t) = req.temperature {
            gen_config["temperature"] = serde_json::json!(t);
        }
        if let Some(m) = req.max_tokens {
            gen_config["maxOutputTokens"] = serde_json::json!(m);
        }
        if req.json_mode {
            gen_config["responseMimeType"] = serde_json::json!("application/json");
        }
        if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
            body["generationConfig"] = gen_config;
        }

        body
    }
}

fn tool_to_gemini(tool: &ToolDefinition) -> Value {
    serde_json::json!({ "name": tool.name, "description": tool.description, "parameters": tool.parameters })
}

fn parse_response(body: &Value, model: &str) -> Result<ChatResponse> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider { provider: "google".into(), message: "no candidates in response".into() })?;

    let parts = candidate.get("content").and_then(|c| c.get("parts")).and_then(|p| p.as_array());

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    if let Some(parts) = parts {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                content.push_str(text);
            }
            if let Some(fc) = part.get("functionCall") {
                let tool_name = fc.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
                let arguments = fc.get("args").cloned().unwrap_or(Value::Object(Default::default()));
                tool_calls.push(ToolCall {
                    call_id: format!("call_{}", uuid::Uuid::new_v4()),
                    tool_name,
                    arguments,
                });
            }
        }
    }

    let finish_reason = candidate.get("finishReason").and_then(|v| v.as_str()).map(|s| match s {
        "STOP" => "stop".to_string(),
        "MAX_TOKENS" => "length".to_string(),
        other => other.to_lowercase(),
    });

    Ok(ChatResponse { content, tool_calls, model: model.to_string(), finish_reason })
}

#[async_trait::async_trait]
impl LlmProvider for GoogleProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());
        let body = self.build_body(&req);
        let resp = self
            .client
            .post(self.generate_url(&model))
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider { provider: "google".into(), message: format!("{status}: {text}") });
        }

        let value: Value = resp.json().await.map_err(from_reqwest)?;
        parse_response(&value, &model)
    }

    async fn chat_with_tools(&self, req: ChatRequest) -> Result<ChatResponse> {
        self.chat(req).await
    }

    async fn embed(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
        let model = req.model.clone().unwrap_or_else(|| "text-embedding-004".to_string());
        let mut embeddings = Vec::with_capacity(req.input.len());
        for text in &req.input {
            let body = serde_json::json!({
                "model": format!("models/{model}"),
                "content": {"parts": [{"text": text}]},
            });
            let resp = self
                .client
                .post(self.embed_url(&model))
                .json(&body)
                .send()
                .await
                .map_err(from_reqwest)?;

            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::Provider { provider: "google".into(), message: format!("{status}: {text}") });
            }

            let value: Value = resp.json().await.map_err(from_reqwest)?;
            let values: Vec<f32> = value
                .get("embedding")
                .and_then(|e| e.get("values"))
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|x| x.as_f64()).map(|x| x as f32).collect())
                .unwrap_or_default();
            embeddings.push(values);
        }
        Ok(EmbeddingsResponse { embeddings })
    }

    fn provider_id(&self) -> &str {
        "google"
    }
}
