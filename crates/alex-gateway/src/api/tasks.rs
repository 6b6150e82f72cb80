//! `POST /api/v1/tasks/summarize_*` — on-demand runs of the three-tier
//! summarization pipeline, grounded on `sa_gateway::runtime::schedule_runner`'s
//! "trigger now" path but driving `alex_memory::Summarizer` directly.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use alex_memory::SummaryOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// Runs the daily tier over every unsummarized day, capped at 30 per call.
pub async fn summarize_daily(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let days = state.store.get_unsummarized_days(30).await?;
    let mut processed = 0u32;
    let mut completed = 0u32;
    let mut skipped = 0u32;
    let mut errors = Vec::new();

    for date in days {
        processed += 1;
        match state.summarizer.summarize_day(date).await {
            Ok(SummaryOutcome::Completed { .. }) => completed += 1,
            Ok(SummaryOutcome::Skipped { .. }) => skipped += 1,
            Err(e) => errors.push(format!("{date}: {e}")),
        }
    }

    Ok(Json(json!({ "status": "ok", "processed": processed, "completed": completed, "skipped": skipped, "errors": errors })))
}

pub async fn summarize_weekly(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let weeks = state.store.get_unsummarized_weeks(12).await?;
    let mut processed = 0u32;
    let mut completed = 0u32;
    let mut skipped = 0u32;
    let mut errors = Vec::new();

    for week_id in weeks {
        processed += 1;
        match state.summarizer.summarize_week(&week_id).await {
            Ok(SummaryOutcome::Completed { .. }) => completed += 1,
            Ok(SummaryOutcome::Skipped { .. }) => skipped += 1,
            Err(e) => errors.push(format!("{week_id}: {e}")),
        }
    }

    Ok(Json(json!({ "status": "ok", "processed": processed, "completed": completed, "skipped": skipped, "errors": errors })))
}

pub async fn summarize_monthly(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let months = state.store.get_unsummarized_months(6).await?;
    let mut processed = 0u32;
    let mut completed = 0u32;
    let mut skipped = 0u32;
    let mut errors = Vec::new();

    for month_id in months {
        processed += 1;
        match state.summarizer.summarize_month(&month_id).await {
            Ok(SummaryOutcome::Completed { .. }) => completed += 1,
            Ok(SummaryOutcome::Skipped { .. }) => skipped += 1,
            Err(e) => errors.push(format!("{month_id}: {e}")),
        }
    }

    Ok(Json(json!({ "status": "ok", "processed": processed, "completed": completed, "skipped": skipped, "errors": errors })))
}

/// Runs all three tiers in order (daily feeds weekly feeds monthly), nesting
/// each tier's counts under its own key per spec.md's `_all` variant.
pub async fn summarize_all(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.summarizer.summarize_all_pending(30, 12, 6).await?;

    Ok(Json(json!({
        "status": "ok",
        "processed": report.days_completed + report.weeks_completed + report.months_completed + report.failures,
        "completed": report.days_completed + report.weeks_completed + report.months_completed,
        "skipped": 0,
        "errors": report.failures,
        "daily": { "completed": report.days_completed },
        "weekly": { "completed": report.weeks_completed },
        "monthly": { "completed": report.months_completed },
    })))
}
