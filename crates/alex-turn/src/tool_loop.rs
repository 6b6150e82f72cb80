//! Bounded tool-call loop (§4.6), grounded on
//! `gateway::runtime::turn::run_turn_inner`'s loop shape: call the model,
//! dispatch any tool calls, feed results back, repeat up to a hard cap.
//! Non-streaming (request/response `chat_with_tools`), unlike the teacher's
//! SSE-driven loop — a deliberate simplification (see DESIGN.md).

use alex_domain::tool::{Message, ToolCatalog, ToolInvocation, ToolResult};
use alex_domain::Result;
use alex_providers::{ChatOutcome, ChatRequest, LlmProvider};

pub const MAX_TOOL_LOOPS: usize = 10;

/// Outcome of running the tool loop to completion.
pub struct ToolLoopOutcome {
    pub final_text: String,
    pub invocations: Vec<ToolInvocation>,
    /// `true` if the loop exhausted `MAX_TOOL_LOOPS` without a terminal text
    /// response (§4.6 step 5 — graceful, not an error).
    pub exhausted: bool,
}

/// Runs the catalog-driven tool loop starting from `seed_messages` (the
/// system prompt + user message the caller has already assembled).
pub async fn run(
    provider: &dyn LlmProvider,
    catalog: &dyn ToolCatalog,
    model: Option<String>,
    mut messages: Vec<Message>,
) -> Result<ToolLoopOutcome> {
    let tool_defs = catalog.definitions();
    let mut invocations = Vec::new();
    let mut last_text = String::new();

    for loop_idx in 0..MAX_TOOL_LOOPS {
        let req = ChatRequest {
            messages: messages.clone(),
            tools: tool_defs.clone(),
            model: model.clone(),
            ..Default::default()
        };

        let outcome = provider.chat_with_tools(req).await?.into_outcome();

        let calls = match outcome {
            ChatOutcome::Text { content, .. } => {
                return Ok(ToolLoopOutcome { final_text: content, invocations, exhausted: false });
            }
            ChatOutcome::ToolCalls { calls, model: _ } => calls,
        };

        tracing::debug!(loop_idx, call_count = calls.len(), "tool loop iteration");

        messages.push(Message::assistant(format_tool_call_summary(&calls)));

        let mut result_lines = Vec::new();
        for call in &calls {
            let result = catalog.invoke(&call.tool_name, call.arguments.clone()).await;
            result_lines.push(format!(
                "{}({}) -> {}",
                call.tool_name,
                call.arguments,
                serde_json::to_string(&result).unwrap_or_else(|_| "{}".to_string())
            ));
            invocations.push(ToolInvocation {
                tool_name: call.tool_name.clone(),
                arguments: call.arguments.clone(),
                result: result.clone(),
            });
            last_text = tool_result_preview(&result);
        }

        messages.push(Message::tool_result(result_lines.join("\n")));
    }

    tracing::warn!(max_loops = MAX_TOOL_LOOPS, "tool loop exhausted without a terminal text response");
    Ok(ToolLoopOutcome { final_text: last_text, invocations, exhausted: true })
}

fn format_tool_call_summary(calls: &[alex_domain::tool::ToolCall]) -> String {
    calls.iter().map(|c| format!("[calling {} with {}]", c.tool_name, c.arguments)).collect::<Vec<_>>().join(" ")
}

fn tool_result_preview(result: &ToolResult) -> String {
    if result.success {
        result.data.to_string()
    } else {
        result.error.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alex_domain::tool::ToolDefinition;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubCatalog;

    #[async_trait]
    impl ToolCatalog for StubCatalog {
        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![ToolDefinition { name: "echo".into(), description: "echoes".into(), parameters: serde_json::json!({}) }]
        }
        async fn invoke(&self, _tool_name: &str, arguments: serde_json::Value) -> ToolResult {
            ToolResult::ok(arguments)
        }
    }

    struct StubProvider {
        calls_remaining: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn chat(&self, _req: ChatRequest) -> Result<alex_providers::ChatResponse> {
            unreachable!("loop always uses chat_with_tools")
        }

        async fn chat_with_tools(&self, _req: ChatRequest) -> Result<alex_providers::ChatResponse> {
            if self.calls_remaining.fetch_sub(1, Ordering::SeqCst) > 1 {
                Ok(alex_providers::ChatResponse {
                    content: String::new(),
                    tool_calls: vec![alex_domain::tool::ToolCall {
                        call_id: "c1".into(),
                        tool_name: "echo".into(),
                        arguments: serde_json::json!({"x": 1}),
                    }],
                    model: "stub".into(),
                    finish_reason: Some("tool_calls".into()),
                })
            } else {
                Ok(alex_providers::ChatResponse {
                    content: "done".into(),
                    tool_calls: vec![],
                    model: "stub".into(),
                    finish_reason: Some("stop".into()),
                })
            }
        }

        async fn embed(&self, _req: alex_providers::EmbeddingsRequest) -> Result<alex_providers::EmbeddingsResponse> {
            unreachable!("loop does not embed")
        }

        fn provider_id(&self) -> &str {
            "stub"
        }
    }

    #[tokio::test]
    async fn stops_when_model_returns_plain_text() {
        let provider = StubProvider { calls_remaining: AtomicUsize::new(1) };
        let catalog = StubCatalog;
        let outcome = run(&provider, &catalog, None, vec![Message::user("hi")]).await.unwrap();
        assert_eq!(outcome.final_text, "done");
        assert!(outcome.invocations.is_empty());
        assert!(!outcome.exhausted);
    }

    #[tokio::test]
    async fn dispatches_tool_calls_then_terminates() {
        let provider = StubProvider { calls_remaining: AtomicUsize::new(3) };
        let catalog = StubCatalog;
        let outcome = run(&provider, &catalog, None, vec![Message::user("hi")]).await.unwrap();
        assert_eq!(outcome.final_text, "done");
        assert_eq!(outcome.invocations.len(), 2);
        assert!(!outcome.exhausted);
    }

    #[tokio::test]
    async fn exhausts_loop_gracefully_without_terminal_text() {
        let provider = StubProvider { calls_remaining: AtomicUsize::new(1000) };
        let catalog = StubCatalog;
        let outcome = run(&provider, &catalog, None, vec![Message::user("hi")]).await.unwrap();
        assert!(outcome.exhausted);
        assert_eq!(outcome.invocations.len(), MAX_TOOL_LOOPS);
    }
}
