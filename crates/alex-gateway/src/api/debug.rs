//! `GET /api/v1/debug/*` — introspection endpoints, grounded on
//! `sa_gateway::api::admin::system_info`'s diagnostic-dump style.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InteractionsQuery {
    pub date: Option<String>,
    pub limit: Option<i64>,
}

pub async fn interactions(
    State(state): State<AppState>,
    Query(q): Query<InteractionsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let date = match q.date {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|_| alex_domain::Error::Config(format!("invalid date '{s}', expected YYYY-MM-DD")))?,
        None => chrono::Utc::now().date_naive(),
    };

    let mut rows = state.store.get_interactions_for_date(date).await?;
    let limit = q.limit.unwrap_or(50).max(0) as usize;
    rows.truncate(limit);

    Ok(Json(json!({ "date": date.to_string(), "count": rows.len(), "interactions": rows })))
}

#[derive(Debug, Deserialize)]
pub struct SemanticSearchQuery {
    pub query: String,
    pub top_k: Option<i64>,
}

pub async fn semantic_search(
    State(state): State<AppState>,
    Query(q): Query<SemanticSearchQuery>,
) -> Json<serde_json::Value> {
    let top_k = q.top_k.unwrap_or(10);
    let results = state.retriever.semantic_search(&q.query, top_k, 0.0).await;
    Json(json!({ "query": q.query, "top_k": top_k, "results": results }))
}

pub async fn summaries(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let unsummarized_days = state.store.get_unsummarized_days(5).await?;
    let recent_day = unsummarized_days.first().copied();
    let daily = match recent_day {
        Some(d) => state.store.get_daily_summary(d).await?,
        None => None,
    };

    Ok(Json(json!({
        "most_recent_pending_day": recent_day.map(|d| d.to_string()),
        "sample_daily_summary": daily,
    })))
}

pub async fn unsummarized(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let days = state.store.get_unsummarized_days(100).await?;
    let weeks = state.store.get_unsummarized_weeks(50).await?;
    let months = state.store.get_unsummarized_months(24).await?;

    Ok(Json(json!({
        "days": days.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "weeks": weeks,
        "months": months,
    })))
}
