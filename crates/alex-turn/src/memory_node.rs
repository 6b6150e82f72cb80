//! The `retrieve_memory` node (§4.1/§4.3): assembles a `MemoryContext` from
//! the retriever's temporal, semantic, and concept-graph sub-queries. Any
//! sub-query failing is already handled fail-soft inside `Retriever`
//! (§8 "Retriever fail-soft"); this node just composes the results.

use alex_domain::entities::{Interaction, MemoryContext};
use alex_domain::turn::TurnStateDelta;
use alex_memory::Retriever;
use chrono::Utc;
use std::collections::HashSet;

pub async fn retrieve_memory(retriever: &Retriever, user_id: &str, user_message: &str, topics: &[String], entities: &[String]) -> TurnStateDelta {
    let today = Utc::now().date_naive();
    let daily_context = retriever.get_daily_context(today).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "daily context retrieval failed, proceeding with empty context");
        Default::default()
    });

    let semantic_matches = if user_message.len() > 10 {
        retriever.semantic_search(user_message, 5, 0.7).await
    } else {
        Vec::new()
    };

    let mut seen = HashSet::new();
    let mut relevant_interactions: Vec<Interaction> = Vec::new();
    for interaction in daily_context.recent_interactions {
        if seen.insert(interaction.id) {
            relevant_interactions.push(interaction);
        }
    }
    for row in semantic_matches {
        if seen.insert(row.id) {
            relevant_interactions.push(Interaction {
                id: row.id,
                user_id: user_id.to_string(),
                date: row.date,
                timestamp: row.date.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc(),
                user_message: row.user_message,
                assistant_response: row.assistant_response,
                intent: None,
                complexity_score: row.score,
                model_used: None,
                embedding: None,
            });
        }
    }

    let related_concepts = if topics.is_empty() { Vec::new() } else { retriever.get_related_concepts(topics).await };
    let related_projects = if entities.is_empty() { Vec::new() } else { retriever.get_related_projects(entities).await };

    let memory = MemoryContext {
        daily_summary: daily_context.daily_summary,
        weekly_summary: daily_context.weekly_summary,
        relevant_interactions,
        related_concepts,
        related_projects,
    };

    TurnStateDelta { memory: Some(memory), ..Default::default() }
}
