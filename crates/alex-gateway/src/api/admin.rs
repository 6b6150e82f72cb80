//! `POST /api/v1/admin/backfill-embeddings` — embeds interactions that
//! predate an embedding model change or failed fail-soft at write time.
//! Grounded on `sa_gateway::api::admin`'s batch-operation handlers; caps
//! work per call the way the rest of admin.rs bounds batch endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use alex_providers::EmbeddingsRequest;

use crate::error::ApiError;
use crate::state::AppState;

const BACKFILL_BATCH_LIMIT: i64 = 100;

pub async fn backfill_embeddings(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let candidates = state.store.get_interactions_missing_embeddings(BACKFILL_BATCH_LIMIT).await?;
    let provider = state.registry.for_role("flash")?;

    let mut embedded = 0u32;
    let mut failed = 0u32;

    for (id, user_message) in candidates {
        let req = EmbeddingsRequest {
            input: vec![user_message],
            model: Some(state.config.model.embedding_model.clone()),
        };
        match provider.embed(req).await {
            Ok(resp) => match resp.embeddings.into_iter().next() {
                Some(vector) => match state.store.update_interaction_embedding(id, vector).await {
                    Ok(()) => embedded += 1,
                    Err(e) => {
                        tracing::warn!(%id, error = %e, "failed to store backfilled embedding");
                        failed += 1;
                    }
                },
                None => failed += 1,
            },
            Err(e) => {
                tracing::warn!(%id, error = %e, "failed to embed interaction during backfill");
                failed += 1;
            }
        }
    }

    Ok(Json(json!({ "status": "ok", "embedded": embedded, "failed": failed })))
}
