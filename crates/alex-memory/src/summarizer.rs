//! Three-tier recursive summarization pipeline (§4.4): daily interactions
//! roll up into daily summaries, daily summaries into weekly, weekly into
//! monthly. Grounded on `alex/memory/summarizer.py`'s `summarize_day` /
//! `summarize_week` / `summarize_month`.

use crate::parse::parse_summary_response;
use crate::prompts::{daily_summary_prompt, monthly_summary_prompt, weekly_summary_prompt};
use alex_domain::Result;
use alex_providers::{ChatRequest, EmbeddingsRequest, LlmProvider};
use alex_store::PostgresStore;
use chrono::NaiveDate;
use std::sync::Arc;

/// Outcome of a single summarization call: either a tier was produced, or
/// it was skipped because there was nothing to summarize (§4.4's
/// idempotence/coverage invariant — skipping is not an error).
#[derive(Debug, Clone)]
pub enum SummaryOutcome {
    Completed { source_count: i32, key_labels: Vec<String> },
    Skipped { reason: &'static str },
}

pub struct Summarizer {
    store: Arc<PostgresStore>,
    provider: Arc<dyn LlmProvider>,
    flash_model: String,
    pro_model: String,
    embedding_model: String,
}

impl Summarizer {
    pub fn new(
        store: Arc<PostgresStore>,
        provider: Arc<dyn LlmProvider>,
        flash_model: impl Into<String>,
        pro_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            flash_model: flash_model.into(),
            pro_model: pro_model.into(),
            embedding_model: embedding_model.into(),
        }
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let req = EmbeddingsRequest { input: vec![text.to_string()], model: Some(self.embedding_model.clone()) };
        match self.provider.embed(req).await {
            Ok(resp) => resp.embeddings.into_iter().next(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to generate summary embedding");
                None
            }
        }
    }

    async fn complete(&self, prompt: String, max_tokens: u32, model: &str) -> Result<String> {
        let req = ChatRequest {
            messages: vec![alex_domain::tool::Message::user(prompt)],
            temperature: Some(0.3),
            max_tokens: Some(max_tokens),
            model: Some(model.to_string()),
            ..Default::default()
        };
        Ok(self.provider.chat(req).await?.content)
    }

    pub async fn summarize_day(&self, date: NaiveDate) -> Result<SummaryOutcome> {
        let interactions = self.store.get_interactions_for_date(date).await?;
        if interactions.is_empty() {
            tracing::info!(%date, "no interactions to summarize");
            return Ok(SummaryOutcome::Skipped { reason: "no_interactions" });
        }

        let interaction_texts: Vec<String> = interactions
            .iter()
            .enumerate()
            .map(|(i, interaction)| {
                let user_msg = truncate(&interaction.user_message, 500);
                let assistant_msg = truncate(&interaction.assistant_response, 1000);
                let intent = interaction.intent.as_deref().unwrap_or("unknown");
                format!("[{}] Intent: {intent}\nUser: {user_msg}\nAssistant: {assistant_msg}\n", i + 1)
            })
            .collect();

        let prompt = daily_summary_prompt(&date.to_string(), &interaction_texts.join("\n---\n"));
        let response = self.complete(prompt, 2048, &self.flash_model).await?;
        let (content, key_topics) = parse_summary_response(&response);
        let embedding = self.embed(&content).await;

        self.store
            .create_daily_summary(date, &content, &key_topics, interactions.len() as i32, &self.flash_model, embedding)
            .await?;

        tracing::info!(%date, interaction_count = interactions.len(), topics_count = key_topics.len(), "daily summary created");
        Ok(SummaryOutcome::Completed { source_count: interactions.len() as i32, key_labels: key_topics })
    }

    pub async fn summarize_week(&self, week_id: &str) -> Result<SummaryOutcome> {
        let daily = self.store.get_daily_summaries_for_week(week_id).await?;
        if daily.is_empty() {
            tracing::info!(week_id, "no daily summaries to aggregate");
            return Ok(SummaryOutcome::Skipped { reason: "no_daily_summaries" });
        }

        let mut total_interactions = 0i32;
        let summary_texts: Vec<String> = daily
            .iter()
            .map(|ds| {
                total_interactions += ds.interaction_count;
                let content = truncate(&ds.content, 1500);
                let topics_str = if ds.key_topics.is_empty() { "N/A".to_string() } else { ds.key_topics.join(", ") };
                format!("**{}** ({} interactions)\nTopics: {topics_str}\n{content}\n", ds.date, ds.interaction_count)
            })
            .collect();

        let prompt = weekly_summary_prompt(week_id, &summary_texts.join("\n---\n"));
        let response = self.complete(prompt, 3072, &self.flash_model).await?;
        let (content, key_themes) = parse_summary_response(&response);
        let embedding = self.embed(&content).await;

        self.store
            .create_weekly_summary(week_id, &content, &key_themes, daily.len() as i32, total_interactions, &self.flash_model, embedding)
            .await?;

        tracing::info!(week_id, daily_summary_count = daily.len(), "weekly summary created");
        Ok(SummaryOutcome::Completed { source_count: daily.len() as i32, key_labels: key_themes })
    }

    pub async fn summarize_month(&self, month_id: &str) -> Result<SummaryOutcome> {
        let weekly = self.store.get_weekly_summaries_for_month(month_id).await?;
        if weekly.is_empty() {
            tracing::info!(month_id, "no weekly summaries to aggregate");
            return Ok(SummaryOutcome::Skipped { reason: "no_weekly_summaries" });
        }

        let mut total_interactions = 0i32;
        let summary_texts: Vec<String> = weekly
            .iter()
            .map(|ws| {
                total_interactions += ws.total_interactions;
                let content = truncate(&ws.content, 2000);
                let themes_str = if ws.key_themes.is_empty() { "N/A".to_string() } else { ws.key_themes.join(", ") };
                format!("**{}**\nThemes: {themes_str}\n{content}\n", ws.week_id)
            })
            .collect();

        let (year, month_num) = month_id
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
            .ok_or_else(|| alex_domain::Error::Other(format!("invalid month_id: {month_id}")))?;
        let month_name = month_name_for(month_num);

        let prompt = monthly_summary_prompt(month_name, year, &summary_texts.join("\n---\n"));
        let response = self.complete(prompt, 3072, &self.pro_model).await?;
        let (content, key_themes) = parse_summary_response(&response);
        let embedding = self.embed(&content).await;

        self.store
            .create_monthly_summary(month_id, &content, &key_themes, weekly.len() as i32, total_interactions, &self.pro_model, embedding)
            .await?;

        tracing::info!(month_id, weekly_summary_count = weekly.len(), "monthly summary created");
        Ok(SummaryOutcome::Completed { source_count: weekly.len() as i32, key_labels: key_themes })
    }

    /// Sweeps unsummarized days, then weeks, then months, in that order —
    /// a batch form of the three-tier pipeline for the scheduler loop (§6).
    pub async fn summarize_all_pending(&self, day_limit: i64, week_limit: i64, month_limit: i64) -> Result<PendingSummaryReport> {
        let mut report = PendingSummaryReport::default();

        for date in self.store.get_unsummarized_days(day_limit).await? {
            match self.summarize_day(date).await {
                Ok(SummaryOutcome::Completed { .. }) => report.days_completed += 1,
                Ok(SummaryOutcome::Skipped { .. }) => {}
                Err(e) => {
                    tracing::warn!(%date, error = %e, "daily summarization failed");
                    report.failures += 1;
                }
            }
        }

        for week_id in self.store.get_unsummarized_weeks(week_limit).await? {
            match self.summarize_week(&week_id).await {
                Ok(SummaryOutcome::Completed { .. }) => report.weeks_completed += 1,
                Ok(SummaryOutcome::Skipped { .. }) => {}
                Err(e) => {
                    tracing::warn!(week_id, error = %e, "weekly summarization failed");
                    report.failures += 1;
                }
            }
        }

        for month_id in self.store.get_unsummarized_months(month_limit).await? {
            match self.summarize_month(&month_id).await {
                Ok(SummaryOutcome::Completed { .. }) => report.months_completed += 1,
                Ok(SummaryOutcome::Skipped { .. }) => {}
                Err(e) => {
                    tracing::warn!(month_id, error = %e, "monthly summarization failed");
                    report.failures += 1;
                }
            }
        }

        Ok(report)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PendingSummaryReport {
    pub days_completed: u32,
    pub weeks_completed: u32,
    pub months_completed: u32,
    pub failures: u32,
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn month_name_for(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ];
    NAMES.get((month.saturating_sub(1)) as usize).copied().unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 50), "hi");
    }

    #[test]
    fn month_name_lookup() {
        assert_eq!(month_name_for(1), "January");
        assert_eq!(month_name_for(12), "December");
    }
}
