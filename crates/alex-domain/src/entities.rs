//! Core entities of §3 of the spec — users, days, interactions, concepts,
//! rolling summaries, code changes, and trade audit rows.
//!
//! These are plain data carriers; persistence lives in `alex-store`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable user identifier. Created lazily on first reference.
pub type UserId = String;

/// Calendar date with the derived time-tree fields (§3 Day).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Day {
    pub date: NaiveDate,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub week_number: i32,
    pub day_of_week: i32,
}

impl Day {
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            date,
            year: date.year_ce().1 as i32,
            month: date.month() as i32,
            day: date.day() as i32,
            week_number: iso.week() as i32,
            day_of_week: date.format("%u").to_string().parse().unwrap_or(1),
        }
    }

    /// ISO week identifier, e.g. `"2026-W04"`.
    pub fn week_id(&self) -> String {
        format!("{}-W{:02}", self.date.iso_week().year(), self.date.iso_week().week())
    }

    /// Month identifier, e.g. `"2026-7"`.
    pub fn month_id(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

/// One completed turn (§3 Interaction). Immutable after write other than
/// a backfilled embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub assistant_response: String,
    pub intent: Option<String>,
    pub complexity_score: f32,
    pub model_used: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

/// A named concept extracted from topics (§3 Concept).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: Uuid,
    pub name: String,
    pub normalized_name: String,
    pub first_mentioned: DateTime<Utc>,
    pub mention_count: i64,
}

/// Rolling summary shared shape for daily/weekly/monthly tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub content: String,
    pub key_topics: Vec<String>,
    pub source_count: i32,
    pub model_used: String,
    pub embedding: Option<Vec<f32>>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_id: String,
    pub content: String,
    pub key_themes: Vec<String>,
    pub source_count: i32,
    pub total_interactions: i32,
    pub model_used: String,
    pub embedding: Option<Vec<f32>>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month_id: String,
    pub content: String,
    pub key_themes: Vec<String>,
    pub source_count: i32,
    pub total_interactions: i32,
    pub model_used: String,
    pub embedding: Option<Vec<f32>>,
    pub generated_at: DateTime<Utc>,
}

/// Change type of a recorded self-modification (§3 CodeChange).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    #[default]
    Feature,
    Bugfix,
    Refactor,
    Test,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChange {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub files_modified: Vec<String>,
    pub description: String,
    pub reasoning: String,
    pub change_type: ChangeType,
    pub commit_sha: Option<String>,
    pub related_interaction_id: Option<Uuid>,
}

/// Append-only, persisted audit record of a confirmed, submitted order.
///
/// Populates the full shape resolved from the spec's Open Question (§9):
/// whatever fields are unknown at confirmation time default to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeAudit {
    pub trade_id: String,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub action: String,
    pub quantity: i64,
    pub price: Option<f64>,
    pub instrument_type: String,
    pub option_symbol: Option<String>,
    pub account: String,
    pub mode: String,
    pub order_id: Option<String>,
    pub status: Option<String>,
}

/// Transient, per-turn bundle of retrieved memory artifacts (§3 MemoryContext).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryContext {
    pub daily_summary: Option<String>,
    pub weekly_summary: Option<String>,
    pub relevant_interactions: Vec<Interaction>,
    pub related_concepts: Vec<String>,
    pub related_projects: Vec<String>,
}
