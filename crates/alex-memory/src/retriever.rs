//! Hybrid retrieval: temporal, semantic, and concept-graph lookups combined
//! into the context a turn hands to a cortex (§4.3). Grounded on
//! `alex/memory/retriever.py`'s `HybridRetriever`.

use alex_domain::entities::Interaction;
use alex_domain::Result;
use alex_providers::{EmbeddingsRequest, LlmProvider};
use alex_store::{DailySummaryRow, MonthlySummaryRow, PostgresStore, SemanticSearchRow, WeeklySummaryRow};
use chrono::NaiveDate;
use std::sync::Arc;

/// Context for a single day: the summary if one has been generated, else a
/// capped window of raw interactions, plus the enclosing week's summary.
#[derive(Debug, Clone, Default)]
pub struct DailyContext {
    pub daily_summary: Option<String>,
    pub weekly_summary: Option<String>,
    pub recent_interactions: Vec<Interaction>,
    pub week_id: String,
}

/// The tier `adaptive_retrieve` picked, and what it found there (§4.3).
#[derive(Debug, Clone)]
pub enum RetrievalLevel {
    Interactions(Vec<Interaction>),
    Daily(Option<DailySummaryRow>),
    Weekly(Option<WeeklySummaryRow>),
    Monthly(Option<MonthlySummaryRow>),
}

#[derive(Debug, Clone)]
pub struct AdaptiveRetrieval {
    pub days_ago: i64,
    pub target_date: NaiveDate,
    pub level: RetrievalLevel,
}

pub struct Retriever {
    store: Arc<PostgresStore>,
    provider: Arc<dyn LlmProvider>,
    embedding_model: String,
}

impl Retriever {
    pub fn new(store: Arc<PostgresStore>, provider: Arc<dyn LlmProvider>, embedding_model: impl Into<String>) -> Self {
        Self { store, provider, embedding_model: embedding_model.into() }
    }

    pub async fn get_daily_context(&self, date: NaiveDate) -> Result<DailyContext> {
        let daily_summary = self.store.get_daily_summary(date).await?;

        let recent_interactions = if daily_summary.is_none() {
            let mut interactions = self.store.get_interactions_for_date(date).await?;
            interactions.truncate(5);
            interactions
        } else {
            Vec::new()
        };

        let week_id = alex_domain::entities::Day::from_date(date).week_id();
        let weekly_summary = self.store.get_weekly_summary(&week_id).await?;

        Ok(DailyContext {
            daily_summary: daily_summary.map(|d| d.content),
            weekly_summary: weekly_summary.map(|w| w.content),
            recent_interactions,
            week_id,
        })
    }

    /// Fails soft to an empty result set — a down embedding provider or
    /// store should degrade retrieval, not the whole turn (§4.3).
    pub async fn semantic_search(&self, query: &str, top_k: i64, min_score: f32) -> Vec<SemanticSearchRow> {
        let embed_result = self
            .provider
            .embed(EmbeddingsRequest { input: vec![query.to_string()], model: Some(self.embedding_model.clone()) })
            .await;

        let embedding = match embed_result.and_then(|r| {
            r.embeddings.into_iter().next().ok_or_else(|| alex_domain::Error::Other("empty embedding response".into()))
        }) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(error = %e, "semantic search embedding failed");
                return Vec::new();
            }
        };

        match self.store.semantic_search(embedding, top_k, min_score).await {
            Ok(results) => {
                tracing::info!(query_len = query.len(), results_count = results.len(), "semantic search completed");
                results
            }
            Err(e) => {
                tracing::error!(error = %e, "semantic search failed");
                Vec::new()
            }
        }
    }

    pub async fn get_related_concepts(&self, topics: &[String]) -> Vec<String> {
        match self.store.get_related_concepts(topics).await {
            Ok(mut related) => {
                related.truncate(10);
                related
            }
            Err(e) => {
                tracing::error!(error = %e, "related concepts lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn get_related_projects(&self, entities: &[String]) -> Vec<String> {
        match self.store.get_related_projects(entities).await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::error!(error = %e, "related projects lookup failed");
                Vec::new()
            }
        }
    }

    /// Picks the coarsest summary tier that still covers `query_date`:
    /// same/yesterday gets raw interactions, within a week gets the daily
    /// summary, within a month gets the weekly summary, older gets monthly.
    pub async fn adaptive_retrieve(&self, today: NaiveDate, query_date: Option<NaiveDate>) -> Result<AdaptiveRetrieval> {
        let target_date = query_date.unwrap_or(today);
        let days_ago = (today - target_date).num_days();

        let level = if days_ago <= 1 {
            RetrievalLevel::Interactions(self.store.get_interactions_for_date(target_date).await?)
        } else if days_ago <= 7 {
            RetrievalLevel::Daily(self.store.get_daily_summary(target_date).await?)
        } else if days_ago <= 30 {
            let week_id = alex_domain::entities::Day::from_date(target_date).week_id();
            RetrievalLevel::Weekly(self.store.get_weekly_summary(&week_id).await?)
        } else {
            let month_id = alex_domain::entities::Day::from_date(target_date).month_id();
            RetrievalLevel::Monthly(self.store.get_monthly_summary(&month_id).await?)
        };

        Ok(AdaptiveRetrieval { days_ago, target_date, level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn days_ago_math_matches_tier_boundaries() {
        let today = day("2026-07-31");
        assert_eq!((today - day("2026-07-30")).num_days(), 1);
        assert_eq!((today - day("2026-07-24")).num_days(), 7);
        assert_eq!((today - day("2026-07-01")).num_days(), 30);
        assert!((today - day("2026-01-01")).num_days() > 30);
    }
}
