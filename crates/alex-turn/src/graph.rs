//! Drives one turn through the node graph (§4.1): classify -> route ->
//! (retrieve_memory -> route) -> a cortex responder -> should_store ->
//! store_interaction. Every edge in `routing` is a pure function of
//! `TurnState`, so this driver is the only place that actually calls the
//! node functions and applies their deltas.

use crate::routing::{route_after_classify, route_after_memory, should_store, RouteAfterClassify, RouteAfterMemory, StoreDecision};
use crate::{classify, memory_node, responders};
use alex_domain::tool::ToolCatalog;
use alex_domain::turn::{TurnState, TurnStateDelta};
use alex_domain::Config;
use alex_memory::Retriever;
use alex_providers::{EmbeddingsRequest, ProviderRegistry};
use alex_store::PostgresStore;
use std::sync::Arc;
use uuid::Uuid;

pub struct TurnDeps {
    pub registry: Arc<ProviderRegistry>,
    pub config: Arc<Config>,
    pub store: Arc<PostgresStore>,
    pub retriever: Arc<Retriever>,
    pub catalog: Arc<dyn ToolCatalog>,
}

/// Final, durable result of a turn: what the caller (gateway HTTP handler)
/// needs to answer the request.
pub struct TurnOutcome {
    pub assistant_response: String,
    pub model_used: Option<String>,
    pub intent: Option<String>,
    pub complexity_score: f32,
    pub cortex: Option<alex_domain::turn::Cortex>,
    pub error: Option<String>,
}

/// §4.1 "On any node error: emit an assistant message ... and mark
/// stage = error" — the terminal node every error edge routes to.
fn handle_error(state: &TurnState) -> TurnStateDelta {
    let message = state.error.clone().unwrap_or_else(|| "unknown error".to_string());
    let text = format!("I encountered an error: {message}. Please try again.");
    TurnStateDelta {
        append_message: Some(alex_domain::tool::Message::assistant(&text)),
        assistant_response: Some(text),
        ..Default::default()
    }
}

pub async fn run_turn(deps: &TurnDeps, session_key: &str, user_id: &str, user_message: &str) -> TurnOutcome {
    let mut state = TurnState::new(session_key, user_id, user_message);

    let provider = match deps.registry.for_role("flash") {
        Ok(p) => p,
        Err(e) => {
            state.apply(TurnStateDelta { error: Some(format!("no provider available: {e}")), ..Default::default() });
            state.apply(handle_error(&state));
            return finish(state);
        }
    };

    state.apply(classify::classify(provider.as_ref(), user_message).await);

    if state.error.is_some() {
        state.apply(handle_error(&state));
        return finish(state);
    }

    let route = route_after_classify(&state, deps.config.model.complexity_threshold);

    match route {
        RouteAfterClassify::HandleError => {
            state.apply(handle_error(&state));
        }
        RouteAfterClassify::SelfModify => {
            let delta = responders::respond_self_modify(
                &deps.registry,
                &deps.store,
                deps.catalog.as_ref(),
                &state.messages,
                &state.memory,
                user_id,
                user_message,
            )
            .await;
            apply_then_finalize(&mut state, delta);
        }
        RouteAfterClassify::Trade => {
            let delta = responders::respond_trade(&deps.registry, &deps.config, deps.catalog.as_ref(), &state.messages, &state.memory).await;
            apply_then_finalize(&mut state, delta);
        }
        RouteAfterClassify::Engineer => {
            let delta = responders::respond_engineer(&deps.registry, &deps.config, &state.messages, &state.memory).await;
            apply_then_finalize(&mut state, delta);
        }
        RouteAfterClassify::RetrieveMemory => {
            let memory_delta = memory_node::retrieve_memory(&deps.retriever, user_id, user_message, &state.topics, &state.entities).await;
            state.apply(memory_delta);

            if state.error.is_some() {
                state.apply(handle_error(&state));
            } else {
                let after_memory = route_after_memory(&state, deps.config.model.complexity_threshold);
                let delta = match after_memory {
                    RouteAfterMemory::HandleError => handle_error(&state),
                    RouteAfterMemory::RespondPro => {
                        responders::respond_pro(&deps.registry, &deps.config, &state.messages, &state.memory).await
                    }
                    RouteAfterMemory::RespondFlash => {
                        responders::respond_flash(&deps.registry, &deps.config, &state.messages, &state.memory).await
                    }
                };
                apply_then_finalize(&mut state, delta);
            }
        }
        RouteAfterClassify::RespondPro => {
            let delta = responders::respond_pro(&deps.registry, &deps.config, &state.messages, &state.memory).await;
            apply_then_finalize(&mut state, delta);
        }
        RouteAfterClassify::RespondFlash => {
            let delta = responders::respond_flash(&deps.registry, &deps.config, &state.messages, &state.memory).await;
            apply_then_finalize(&mut state, delta);
        }
    }

    if state.error.is_none() {
        persist_if_due(deps, &state).await;
    }

    finish(state)
}

fn apply_then_finalize(state: &mut TurnState, delta: TurnStateDelta) {
    let had_error = delta.error.is_some();
    state.apply(delta);
    if had_error {
        let error_delta = handle_error(state);
        state.apply(error_delta);
    }
}

/// Embeds and persists the interaction when `should_store` says to (§4.1
/// step 7). Embedding failure degrades to storing without one rather than
/// discarding the interaction (fail-soft, §8 "Retriever fail-soft" applies
/// symmetrically to writes).
async fn persist_if_due(deps: &TurnDeps, state: &TurnState) {
    if !matches!(should_store(state), StoreDecision::Store) {
        return;
    }
    let Some(user_message) = state.user_message() else { return };
    let Some(assistant_response) = state.assistant_response.as_deref() else { return };

    let embedding = if user_message.len() > 10 {
        let req = EmbeddingsRequest { input: vec![user_message.to_string()], model: Some(deps.config.model.embedding_model.clone()) };
        match deps.registry.for_role("flash").ok() {
            Some(provider) => match provider.embed(req).await {
                Ok(resp) => resp.embeddings.into_iter().next(),
                Err(e) => {
                    tracing::warn!(error = %e, "embedding generation failed, storing interaction without one");
                    None
                }
            },
            None => None,
        }
    } else {
        None
    };

    let result = deps
        .store
        .store_interaction(
            Uuid::new_v4(),
            &state.user_id,
            chrono::Utc::now().date_naive(),
            user_message,
            assistant_response,
            state.intent.as_deref(),
            state.complexity_score,
            state.model_used.as_deref(),
            &state.topics,
            embedding,
        )
        .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "failed to persist interaction");
    }
}

fn finish(state: TurnState) -> TurnOutcome {
    TurnOutcome {
        assistant_response: state.assistant_response.unwrap_or_default(),
        model_used: state.model_used,
        intent: state.intent,
        complexity_score: state.complexity_score,
        cortex: state.cortex,
        error: state.error,
    }
}
