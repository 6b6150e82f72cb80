//! `GET /api/v1/health` — grounded on `sa_gateway::api::admin::health`,
//! extended with the store's table-count probe (§6).

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.store.health_check().await {
        Ok(status) => Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "store": {
                "status": "connected",
                "tables": status.table_counts,
                "pgvector_version": status.pgvector_version,
            },
        })),
        Err(e) => Json(serde_json::json!({
            "status": "degraded",
            "version": env!("CARGO_PKG_VERSION"),
            "store": { "status": "error", "error": e.to_string() },
        })),
    }
}
