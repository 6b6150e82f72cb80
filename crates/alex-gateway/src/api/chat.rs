//! `POST /api/v1/chat` — the core runtime endpoint, grounded on
//! `sa_gateway::api::chat::chat` but delegating all turn logic to
//! `alex_turn::run_turn`.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use alex_domain::turn::Cortex;
use alex_turn::{run_turn, TurnDeps};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationTurn {
    #[allow(dead_code)]
    pub role: String,
    #[allow(dead_code)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Serialize)]
pub struct ChatMetadata {
    pub intent: Option<String>,
    pub complexity_score: f32,
    pub model_used: Option<String>,
    pub latency_ms: u128,
    pub cortex: Option<String>,
}

fn cortex_label(cortex: Cortex) -> &'static str {
    match cortex {
        Cortex::Flash => "flash",
        Cortex::Pro => "pro",
        Cortex::Engineer => "engineer",
        Cortex::SelfModify => "self_modify",
        Cortex::Trade => "trade",
    }
}

pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.is_empty() || req.message.len() > 10_000 {
        return Err(ApiError(alex_domain::Error::Config(
            "message must be between 1 and 10000 characters".into(),
        )));
    }

    let started = Instant::now();
    let user_id = req.user_id.unwrap_or_else(|| "default".to_string());
    let session_id = req.session_id.unwrap_or_else(|| user_id.clone());

    let deps = TurnDeps {
        registry: state.registry.clone(),
        config: state.config.clone(),
        store: state.store.clone(),
        retriever: state.retriever.clone(),
        catalog: state.catalog.clone(),
    };

    let outcome = run_turn(&deps, &session_id, &user_id, &req.message).await;
    let latency_ms = started.elapsed().as_millis();

    Ok(Json(ChatResponse {
        response: outcome.assistant_response,
        session_id,
        metadata: ChatMetadata {
            intent: outcome.intent,
            complexity_score: outcome.complexity_score,
            model_used: outcome.model_used,
            latency_ms,
            cortex: outcome.cortex.map(cortex_label).map(str::to_string),
        },
    }))
}
