//! `GET /api/v1/memory/today` — today's `MemoryContext` for introspection,
//! grounded on `sa_gateway::api::memory`'s proxy handlers but serving the
//! local retriever directly instead of a remote SerialMemory server.

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn today(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let ctx = state.retriever.get_daily_context(today).await?;

    Ok(Json(serde_json::json!({
        "date": today.to_string(),
        "daily_summary": ctx.daily_summary,
        "weekly_summary": ctx.weekly_summary,
        "week_id": ctx.week_id,
        "recent_interactions": ctx.recent_interactions,
    })))
}
