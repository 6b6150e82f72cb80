use serde::{Deserialize, Serialize};

/// Provider-agnostic tool call, as emitted by a `chat_with_tools` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// A tool's JSON-Schema description, handed to the model adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A message in the conversation, provider-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
    pub fn tool_result(content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into() }
    }
}

/// The outcome of invoking a single tool during the tool-call loop (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

impl ToolResult {
    pub fn ok(data: serde_json::Value) -> Self {
        Self { success: true, error: None, data }
    }
    pub fn err(message: impl Into<String>) -> Self {
        Self { success: false, error: Some(message.into()), data: serde_json::Value::Null }
    }
}

/// One recorded tool invocation: name + args + result, in call order (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub result: ToolResult,
}

/// A typed catalog of tools a responder can hand to `chat_with_tools`: one
/// entry per `{name, description, parameter schema, handler}` (§9 Design
/// Notes "Tool schemas"). Implemented by `alex-tools`, consumed by the
/// tool-call loop (§4.6) without `alex-turn` depending on `alex-tools`
/// directly — the catalog is injected by the binary that wires both up.
#[async_trait::async_trait]
pub trait ToolCatalog: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn invoke(&self, tool_name: &str, arguments: serde_json::Value) -> ToolResult;
}
