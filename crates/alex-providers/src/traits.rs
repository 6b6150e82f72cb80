//! Provider-agnostic request/response types and the [`LlmProvider`] trait.
//!
//! Generalized from a streaming `chat`/`chat_stream`/`embeddings` split into
//! the spec's simpler request/response contract: `chat`, `chat_with_tools`,
//! `embed`.

use alex_domain::tool::{Message, ToolCall, ToolDefinition};
use alex_domain::Result;

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
    pub model: Option<String>,
}

/// The outcome of a chat completion: either plain text or one or more tool
/// calls the caller must dispatch and feed back (§4.6).
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    Text { content: String, model: String },
    ToolCalls { calls: Vec<ToolCall>, model: String },
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub model: String,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    pub fn into_outcome(self) -> ChatOutcome {
        if self.tool_calls.is_empty() {
            ChatOutcome::Text { content: self.content, model: self.model }
        } else {
            ChatOutcome::ToolCalls { calls: self.tool_calls, model: self.model }
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingsRequest {
    pub input: Vec<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Trait every model adapter implements. A provider need not support
/// embeddings (e.g. a pure chat model) — the default errors.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Plain chat completion, no tools offered.
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// Chat completion with tool definitions attached; the model may reply
    /// with tool calls instead of text.
    async fn chat_with_tools(&self, req: ChatRequest) -> Result<ChatResponse> {
        self.chat(req).await
    }

    /// Generate text embeddings. Providers that can't embed return an error.
    async fn embed(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse>;

    /// A unique identifier for this provider instance (e.g. `"google"`).
    fn provider_id(&self) -> &str;
}
