//! Turn graph state (§4.1) and its reducer.
//!
//! `TurnState::apply` is the single mutation entry point: message lists
//! append, scalar fields last-write-wins. Nodes produce a `TurnStateDelta`
//! rather than mutating `TurnState` fields directly.

use crate::entities::MemoryContext;
use crate::tool::{Message, ToolInvocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cortex {
    Flash,
    Pro,
    Engineer,
    SelfModify,
    Trade,
}

#[derive(Debug, Clone)]
pub struct TurnState {
    pub session_key: String,
    pub user_id: String,
    pub messages: Vec<Message>,
    pub intent: Option<String>,
    pub complexity_score: f32,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    pub cortex: Option<Cortex>,
    pub memory: MemoryContext,
    pub tool_invocations: Vec<ToolInvocation>,
    pub assistant_response: Option<String>,
    pub model_used: Option<String>,
    pub error: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl TurnState {
    pub fn new(session_key: impl Into<String>, user_id: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            user_id: user_id.into(),
            messages: vec![Message::user(user_message)],
            intent: None,
            complexity_score: 0.0,
            topics: Vec::new(),
            entities: Vec::new(),
            cortex: None,
            memory: MemoryContext::default(),
            tool_invocations: Vec::new(),
            assistant_response: None,
            model_used: None,
            error: None,
            retry_count: 0,
            max_retries: 2,
        }
    }

    pub fn user_message(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| {
            (m.role == crate::tool::Role::User).then_some(m.content.as_str())
        })
    }

    pub fn apply(&mut self, delta: TurnStateDelta) {
        if let Some(m) = delta.append_message {
            self.messages.push(m);
        }
        if let Some(v) = delta.intent {
            self.intent = Some(v);
        }
        if let Some(v) = delta.complexity_score {
            self.complexity_score = v;
        }
        if let Some(v) = delta.topics {
            self.topics = v;
        }
        if let Some(v) = delta.entities {
            self.entities = v;
        }
        if let Some(v) = delta.cortex {
            self.cortex = Some(v);
        }
        if let Some(v) = delta.memory {
            self.memory = v;
        }
        if let Some(v) = delta.tool_invocation {
            self.tool_invocations.push(v);
        }
        if let Some(v) = delta.assistant_response {
            self.assistant_response = Some(v);
        }
        if let Some(v) = delta.model_used {
            self.model_used = Some(v);
        }
        if let Some(v) = delta.error {
            self.error = Some(v);
        }
        if delta.increment_retry {
            self.retry_count += 1;
        }
    }
}

/// A node's proposed mutation. `None` fields leave the corresponding
/// `TurnState` field untouched.
#[derive(Debug, Clone, Default)]
pub struct TurnStateDelta {
    pub append_message: Option<Message>,
    pub intent: Option<String>,
    pub complexity_score: Option<f32>,
    pub topics: Option<Vec<String>>,
    pub entities: Option<Vec<String>>,
    pub cortex: Option<Cortex>,
    pub memory: Option<MemoryContext>,
    pub tool_invocation: Option<ToolInvocation>,
    pub assistant_response: Option<String>,
    pub model_used: Option<String>,
    pub error: Option<String>,
    pub increment_retry: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_appends_messages_and_last_write_wins_on_scalars() {
        let mut state = TurnState::new("sess", "user-1", "hi");
        state.apply(TurnStateDelta {
            intent: Some("question".into()),
            complexity_score: Some(0.3),
            ..Default::default()
        });
        state.apply(TurnStateDelta {
            complexity_score: Some(0.9),
            append_message: Some(Message::assistant("hello")),
            ..Default::default()
        });
        assert_eq!(state.intent.as_deref(), Some("question"));
        assert_eq!(state.complexity_score, 0.9);
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn retry_count_increments() {
        let mut state = TurnState::new("sess", "user-1", "hi");
        state.apply(TurnStateDelta { increment_retry: true, ..Default::default() });
        state.apply(TurnStateDelta { increment_retry: true, ..Default::default() });
        assert_eq!(state.retry_count, 2);
    }
}
