//! Conditional edges of the turn graph (§4.1), ported from
//! `alex/agents/edges.py` and `alex/cortex/router.py`. Pure functions of
//! `TurnState` — no I/O, so routing is trivially unit-testable and
//! deterministic (§8 "Routing determinism").

use alex_domain::turn::TurnState;

const ENGINEERING_INTENTS: [&str; 5] = ["code_change", "refactor", "debug", "test", "deploy"];
const MEMORY_INTENTS: [&str; 3] = ["memory_query", "question", "task_planning"];
const PRO_INTENTS: [&str; 3] = ["task_planning", "architecture", "analysis"];

/// Where the graph should go after `classify` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAfterClassify {
    HandleError,
    SelfModify,
    Trade,
    Engineer,
    RetrieveMemory,
    RespondPro,
    RespondFlash,
}

pub fn route_after_classify(state: &TurnState, complexity_threshold: f32) -> RouteAfterClassify {
    if state.error.is_some() {
        return RouteAfterClassify::HandleError;
    }

    let intent = state.intent.as_deref().unwrap_or("chat");

    if intent == "self_modify" {
        return RouteAfterClassify::SelfModify;
    }
    if intent == "trade" {
        return RouteAfterClassify::Trade;
    }
    if ENGINEERING_INTENTS.contains(&intent) {
        return RouteAfterClassify::Engineer;
    }
    if MEMORY_INTENTS.contains(&intent) {
        return RouteAfterClassify::RetrieveMemory;
    }
    if state.complexity_score >= complexity_threshold || PRO_INTENTS.contains(&intent) {
        return RouteAfterClassify::RespondPro;
    }

    RouteAfterClassify::RespondFlash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAfterMemory {
    HandleError,
    RespondPro,
    RespondFlash,
}

pub fn route_after_memory(state: &TurnState, complexity_threshold: f32) -> RouteAfterMemory {
    if state.error.is_some() {
        return RouteAfterMemory::HandleError;
    }
    if state.complexity_score >= complexity_threshold {
        return RouteAfterMemory::RespondPro;
    }
    if state.memory.relevant_interactions.len() > 3 {
        return RouteAfterMemory::RespondPro;
    }
    RouteAfterMemory::RespondFlash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDecision {
    Store,
    Complete,
}

/// Whether the turn's interaction is worth persisting: an error, or a
/// too-short exchange, ends the turn without a write (§4.1).
pub fn should_store(state: &TurnState) -> StoreDecision {
    if state.error.is_some() {
        return StoreDecision::Complete;
    }

    let user_msg = state.user_message();
    let assistant_msg = state.assistant_response.as_deref();

    match (user_msg, assistant_msg) {
        (Some(u), Some(a)) if u.len() >= 5 && a.len() >= 10 => StoreDecision::Store,
        _ => StoreDecision::Complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alex_domain::entities::{Interaction, MemoryContext};
    use chrono::Utc;
    use uuid::Uuid;

    fn dummy_interaction() -> Interaction {
        Interaction {
            id: Uuid::new_v4(),
            user_id: "user-1".into(),
            date: Utc::now().date_naive(),
            timestamp: Utc::now(),
            user_message: "q".into(),
            assistant_response: "a".into(),
            intent: None,
            complexity_score: 0.0,
            model_used: None,
            embedding: None,
        }
    }

    fn state_with_intent(intent: &str, complexity: f32) -> TurnState {
        let mut s = TurnState::new("sess", "user-1", "hello there");
        s.intent = Some(intent.to_string());
        s.complexity_score = complexity;
        s
    }

    #[test]
    fn routes_self_modify_and_trade_before_complexity() {
        assert_eq!(route_after_classify(&state_with_intent("self_modify", 0.0), 0.7), RouteAfterClassify::SelfModify);
        assert_eq!(route_after_classify(&state_with_intent("trade", 0.0), 0.7), RouteAfterClassify::Trade);
    }

    #[test]
    fn routes_engineering_intents_to_engineer() {
        for intent in ENGINEERING_INTENTS {
            assert_eq!(route_after_classify(&state_with_intent(intent, 0.1), 0.7), RouteAfterClassify::Engineer);
        }
    }

    #[test]
    fn routes_memory_intents_to_retrieve_memory() {
        assert_eq!(route_after_classify(&state_with_intent("question", 0.1), 0.7), RouteAfterClassify::RetrieveMemory);
    }

    #[test]
    fn high_complexity_routes_to_pro() {
        assert_eq!(route_after_classify(&state_with_intent("chat", 0.85), 0.7), RouteAfterClassify::RespondPro);
    }

    #[test]
    fn default_routes_to_flash() {
        assert_eq!(route_after_classify(&state_with_intent("chat", 0.1), 0.7), RouteAfterClassify::RespondFlash);
    }

    #[test]
    fn error_always_routes_to_handle_error() {
        let mut s = state_with_intent("chat", 0.1);
        s.error = Some("boom".into());
        assert_eq!(route_after_classify(&s, 0.7), RouteAfterClassify::HandleError);
        assert_eq!(route_after_memory(&s, 0.7), RouteAfterMemory::HandleError);
    }

    #[test]
    fn route_after_memory_escalates_on_interaction_count() {
        let mut s = state_with_intent("question", 0.2);
        s.memory = MemoryContext {
            relevant_interactions: (0..4).map(|_| dummy_interaction()).collect(),
            ..Default::default()
        };
        assert_eq!(route_after_memory(&s, 0.7), RouteAfterMemory::RespondPro);
    }

    #[test]
    fn should_store_rejects_short_exchanges() {
        let mut s = TurnState::new("sess", "user-1", "hi");
        s.assistant_response = Some("ok".into());
        assert_eq!(should_store(&s), StoreDecision::Complete);
    }

    #[test]
    fn should_store_accepts_normal_exchanges() {
        let mut s = TurnState::new("sess", "user-1", "what's up today");
        s.assistant_response = Some("Not much, how can I help?".into());
        assert_eq!(should_store(&s), StoreDecision::Store);
    }
}
