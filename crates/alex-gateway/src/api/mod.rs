pub mod admin;
pub mod auth;
pub mod chat;
pub mod debug;
pub mod health;
pub mod memory;
pub mod tasks;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Builds the full API router under `/api/v1`. Routes are split into
/// **public** (no auth required) and **protected** (gated behind the
/// `ALEX_API_TOKEN` bearer-token middleware), grounded on
/// `sa_gateway::api::router`'s public/protected merge shape.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health::health));

    let protected = Router::new()
        .route("/chat", post(chat::chat))
        .route("/memory/today", get(memory::today))
        .route("/tasks/summarize_daily", post(tasks::summarize_daily))
        .route("/tasks/summarize_weekly", post(tasks::summarize_weekly))
        .route("/tasks/summarize_monthly", post(tasks::summarize_monthly))
        .route("/tasks/summarize_all", post(tasks::summarize_all))
        .route("/debug/interactions", get(debug::interactions))
        .route("/debug/semantic-search", get(debug::semantic_search))
        .route("/debug/summaries", get(debug::summaries))
        .route("/debug/unsummarized", get(debug::unsummarized))
        .route("/admin/backfill-embeddings", post(admin::backfill_embeddings))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_token));

    Router::new().nest("/api/v1", public.merge(protected)).layer(tower_http::trace::TraceLayer::new_for_http())
}
