//! The `classify` node (§4.1/§4.2): entry point of every turn.

use alex_domain::turn::TurnStateDelta;
use alex_providers::{classifier, LlmProvider};

pub async fn classify(provider: &dyn LlmProvider, user_message: &str) -> TurnStateDelta {
    match classifier::classify(provider, user_message).await {
        Ok(c) => TurnStateDelta {
            intent: Some(c.intent),
            complexity_score: Some(c.complexity_score),
            topics: Some(c.topics),
            entities: Some(c.entities),
            ..Default::default()
        },
        Err(e) => {
            tracing::error!(error = %e, "classify node failed unexpectedly");
            TurnStateDelta { error: Some(format!("classification failed: {e}")), ..Default::default() }
        }
    }
}
