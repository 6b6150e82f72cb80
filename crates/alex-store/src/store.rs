//! Relational memory store: CRUD against Postgres + pgvector, grounded on
//! `alex/memory/postgres_store.py`. Table shape and upsert semantics follow
//! the original; only the pgvector literal marshalling is handled by the
//! `pgvector` crate instead of hand-built `"[...]"` strings.

use alex_domain::entities::{ChangeType, CodeChange, Day, Interaction, TradeAudit};
use alex_domain::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use pgvector::Vector;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ensure_user(&self, user_id: &str) -> Result<()> {
        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    pub async fn ensure_time_tree(&self, date: NaiveDate) -> Result<()> {
        let day = Day::from_date(date);
        sqlx::query(
            "INSERT INTO days (date, year, month, day, week_number, day_of_week) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (date) DO NOTHING",
        )
        .bind(day.date)
        .bind(day.year)
        .bind(day.month)
        .bind(day.day)
        .bind(day.week_number)
        .bind(day.day_of_week)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Stores an interaction, upserting on conflict and linking any topics to
    /// concept records. Always ensures the time tree and user row exist
    /// first, matching `store_interaction`'s ordering.
    #[allow(clippy::too_many_arguments)]
    pub async fn store_interaction(
        &self,
        id: Uuid,
        user_id: &str,
        date: NaiveDate,
        user_message: &str,
        assistant_response: &str,
        intent: Option<&str>,
        complexity_score: f32,
        model_used: Option<&str>,
        topics: &[String],
        embedding: Option<Vec<f32>>,
    ) -> Result<Uuid> {
        self.ensure_time_tree(date).await?;
        self.ensure_user(user_id).await?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO interactions (\
                id, user_id, date, timestamp, user_message, assistant_response, \
                intent, complexity_score, model_used, embedding\
             ) VALUES ($1, $2, $3, NOW(), $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                assistant_response = EXCLUDED.assistant_response, \
                intent = EXCLUDED.intent, \
                complexity_score = EXCLUDED.complexity_score, \
                model_used = EXCLUDED.model_used, \
                embedding = EXCLUDED.embedding",
        )
        .bind(id)
        .bind(user_id)
        .bind(date)
        .bind(user_message)
        .bind(assistant_response)
        .bind(intent)
        .bind(complexity_score)
        .bind(model_used)
        .bind(embedding.map(Vector::from))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for topic in topics {
            link_to_concept(&mut tx, ConceptLink::Interaction(id), topic).await?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(id)
    }

    pub async fn get_interactions_for_date(&self, date: NaiveDate) -> Result<Vec<Interaction>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(
            "SELECT id, user_id, date, timestamp, user_message, assistant_response, \
                    intent, complexity_score, model_used, embedding \
             FROM interactions WHERE date = $1 ORDER BY timestamp",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_daily_summary(&self, date: NaiveDate) -> Result<Option<DailySummaryRow>> {
        let row: Option<DailySummaryRow> = sqlx::query_as(
            "SELECT date, content, key_topics, interaction_count, model_used, embedding, generated_at \
             FROM daily_summaries WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row)
    }

    pub async fn create_daily_summary(
        &self,
        date: NaiveDate,
        content: &str,
        key_topics: &[String],
        interaction_count: i32,
        model_used: &str,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        self.ensure_time_tree(date).await?;

        sqlx::query(
            "INSERT INTO daily_summaries (date, content, key_topics, interaction_count, model_used, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (date) DO UPDATE SET \
                content = EXCLUDED.content, \
                key_topics = EXCLUDED.key_topics, \
                interaction_count = EXCLUDED.interaction_count, \
                model_used = EXCLUDED.model_used, \
                embedding = EXCLUDED.embedding, \
                generated_at = NOW()",
        )
        .bind(date)
        .bind(content)
        .bind(key_topics)
        .bind(interaction_count)
        .bind(model_used)
        .bind(embedding.map(Vector::from))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub async fn get_weekly_summary(&self, week_id: &str) -> Result<Option<WeeklySummaryRow>> {
        let row: Option<WeeklySummaryRow> = sqlx::query_as(
            "SELECT week_id, content, key_themes, total_interactions, model_used, embedding, generated_at \
             FROM weekly_summaries WHERE week_id = $1",
        )
        .bind(week_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row)
    }

    pub async fn get_daily_summaries_for_week(&self, week_id: &str) -> Result<Vec<DailySummaryRow>> {
        let (year, week) = parse_week_id(week_id)?;
        let rows: Vec<DailySummaryRow> = sqlx::query_as(
            "SELECT ds.date, ds.content, ds.key_topics, ds.interaction_count, ds.model_used, ds.embedding, ds.generated_at \
             FROM daily_summaries ds JOIN days d ON ds.date = d.date \
             WHERE d.year = $1 AND d.week_number = $2 ORDER BY ds.date",
        )
        .bind(year)
        .bind(week)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_weekly_summary(
        &self,
        week_id: &str,
        content: &str,
        key_themes: &[String],
        daily_summary_count: i32,
        total_interactions: i32,
        model_used: &str,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        let (year, week) = parse_week_id(week_id)?;
        sqlx::query(
            "INSERT INTO weekly_summaries (\
                week_id, year, week, content, key_themes, \
                daily_summary_count, total_interactions, model_used, embedding\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (week_id) DO UPDATE SET \
                content = EXCLUDED.content, \
                key_themes = EXCLUDED.key_themes, \
                daily_summary_count = EXCLUDED.daily_summary_count, \
                total_interactions = EXCLUDED.total_interactions, \
                model_used = EXCLUDED.model_used, \
                embedding = EXCLUDED.embedding, \
                generated_at = NOW()",
        )
        .bind(week_id)
        .bind(year)
        .bind(week)
        .bind(content)
        .bind(key_themes)
        .bind(daily_summary_count)
        .bind(total_interactions)
        .bind(model_used)
        .bind(embedding.map(Vector::from))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// Weekly summaries whose week overlaps the given month: a week belongs
    /// to a month if any of its days fall in that month (a week spanning a
    /// month boundary is counted in both).
    pub async fn get_weekly_summaries_for_month(&self, month_id: &str) -> Result<Vec<WeeklySummaryRow>> {
        let (year, month) = parse_month_id(month_id)?;
        let rows: Vec<WeeklySummaryRow> = sqlx::query_as(
            "SELECT DISTINCT ws.week_id, ws.content, ws.key_themes, ws.total_interactions, \
                    ws.model_used, ws.embedding, ws.generated_at \
             FROM weekly_summaries ws \
             JOIN days d ON d.year = ws.year AND d.week_number = ws.week \
             WHERE EXTRACT(YEAR FROM d.date) = $1 AND EXTRACT(MONTH FROM d.date) = $2 \
             ORDER BY ws.week_id",
        )
        .bind(year)
        .bind(month)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_monthly_summary(
        &self,
        month_id: &str,
        content: &str,
        key_themes: &[String],
        weekly_summary_count: i32,
        total_interactions: i32,
        model_used: &str,
        embedding: Option<Vec<f32>>,
    ) -> Result<()> {
        let (year, month) = parse_month_id(month_id)?;
        sqlx::query(
            "INSERT INTO monthly_summaries (\
                month_id, year, month, content, key_themes, \
                weekly_summary_count, total_interactions, model_used, embedding\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (month_id) DO UPDATE SET \
                content = EXCLUDED.content, \
                key_themes = EXCLUDED.key_themes, \
                weekly_summary_count = EXCLUDED.weekly_summary_count, \
                total_interactions = EXCLUDED.total_interactions, \
                model_used = EXCLUDED.model_used, \
                embedding = EXCLUDED.embedding, \
                generated_at = NOW()",
        )
        .bind(month_id)
        .bind(year)
        .bind(month)
        .bind(content)
        .bind(key_themes)
        .bind(weekly_summary_count)
        .bind(total_interactions)
        .bind(model_used)
        .bind(embedding.map(Vector::from))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub async fn get_monthly_summary(&self, month_id: &str) -> Result<Option<MonthlySummaryRow>> {
        let row: Option<MonthlySummaryRow> = sqlx::query_as(
            "SELECT month_id, content, key_themes, total_interactions, model_used, embedding, generated_at \
             FROM monthly_summaries WHERE month_id = $1",
        )
        .bind(month_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row)
    }

    pub async fn get_unsummarized_days(&self, limit: i64) -> Result<Vec<NaiveDate>> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            "SELECT d.date FROM days d \
             JOIN interactions i ON d.date = i.date \
             LEFT JOIN daily_summaries ds ON d.date = ds.date \
             WHERE ds.date IS NULL GROUP BY d.date HAVING COUNT(i.id) > 0 \
             ORDER BY d.date DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(|(d,)| d).collect())
    }

    pub async fn get_unsummarized_weeks(&self, limit: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT d.year || '-W' || LPAD(d.week_number::text, 2, '0') AS week_id \
             FROM days d JOIN daily_summaries ds ON d.date = ds.date \
             LEFT JOIN weekly_summaries ws ON ws.year = d.year AND ws.week = d.week_number \
             WHERE ws.week_id IS NULL GROUP BY d.year, d.week_number \
             HAVING COUNT(ds.date) >= 1 ORDER BY d.year DESC, d.week_number DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(|(w,)| w).collect())
    }

    /// Months that have at least one weekly summary (via their days' actual
    /// calendar month) but no monthly summary yet.
    pub async fn get_unsummarized_months(&self, limit: i64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT d.year || '-' || d.month AS month_id \
             FROM days d \
             JOIN weekly_summaries ws ON ws.year = d.year AND ws.week = d.week_number \
             LEFT JOIN monthly_summaries ms ON ms.year = d.year AND ms.month = d.month \
             WHERE ms.month_id IS NULL \
             ORDER BY month_id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(|(m,)| m).collect())
    }

    pub async fn get_related_concepts(&self, concept_names: &[String]) -> Result<Vec<String>> {
        let rows: Vec<(Option<Vec<String>>,)> = sqlx::query_as(
            "SELECT array_agg(DISTINCT c2.name) FILTER (WHERE c2.name IS NOT NULL AND c2.name != c1.name) \
             FROM concepts c1 \
             LEFT JOIN interaction_concepts ic1 ON c1.id = ic1.concept_id \
             LEFT JOIN interaction_concepts ic2 ON ic1.interaction_id = ic2.interaction_id \
             LEFT JOIN concepts c2 ON ic2.concept_id = c2.id \
             WHERE c1.name = ANY($1) \
             GROUP BY c1.id, c1.name",
        )
        .bind(concept_names)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut related: Vec<String> = rows.into_iter().flat_map(|(r,)| r.unwrap_or_default()).collect();
        related.dedup();
        Ok(related)
    }

    pub async fn get_related_projects(&self, entities: &[String]) -> Result<Vec<String>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT p.name FROM projects p \
             WHERE EXISTS (SELECT 1 FROM unnest($1::text[]) AS entity \
                WHERE p.name ILIKE '%' || entity || '%' OR p.description ILIKE '%' || entity || '%') \
             LIMIT 5",
        )
        .bind(entities)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn store_code_change(
        &self,
        id: Uuid,
        user_id: &str,
        date: NaiveDate,
        files_modified: &[String],
        description: &str,
        reasoning: &str,
        change_type: ChangeType,
        commit_sha: Option<&str>,
        related_interaction_id: Option<Uuid>,
    ) -> Result<Uuid> {
        self.ensure_time_tree(date).await?;
        self.ensure_user(user_id).await?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let change_type_str = serde_json::to_value(change_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "feature".to_string());

        sqlx::query(
            "INSERT INTO code_changes (\
                id, user_id, date, timestamp, files_modified, description, \
                reasoning, change_type, commit_sha, related_interaction_id\
             ) VALUES ($1, $2, $3, NOW(), $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO UPDATE SET \
                files_modified = EXCLUDED.files_modified, \
                description = EXCLUDED.description, \
                reasoning = EXCLUDED.reasoning, \
                change_type = EXCLUDED.change_type, \
                commit_sha = EXCLUDED.commit_sha",
        )
        .bind(id)
        .bind(user_id)
        .bind(date)
        .bind(files_modified)
        .bind(description)
        .bind(reasoning)
        .bind(&change_type_str)
        .bind(commit_sha)
        .bind(related_interaction_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for concept in extract_concepts_from_files(files_modified) {
            link_to_concept(&mut tx, ConceptLink::CodeChange(id), &concept).await?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(id)
    }

    pub async fn get_recent_code_changes(&self, limit: i64, change_type: Option<&str>) -> Result<Vec<CodeChangeRow>> {
        let rows: Vec<CodeChangeRow> = if let Some(ct) = change_type {
            sqlx::query_as(
                "SELECT id, user_id, date, timestamp, files_modified, description, reasoning, \
                        change_type, commit_sha, related_interaction_id \
                 FROM code_changes WHERE change_type = $1 ORDER BY timestamp DESC LIMIT $2",
            )
            .bind(ct)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
        } else {
            sqlx::query_as(
                "SELECT id, user_id, date, timestamp, files_modified, description, reasoning, \
                        change_type, commit_sha, related_interaction_id \
                 FROM code_changes ORDER BY timestamp DESC LIMIT $1",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
        };
        Ok(rows)
    }

    pub async fn get_code_changes_for_file(&self, file_path: &str) -> Result<Vec<CodeChangeRow>> {
        let rows: Vec<CodeChangeRow> = sqlx::query_as(
            "SELECT id, user_id, date, timestamp, files_modified, description, reasoning, \
                    change_type, commit_sha, related_interaction_id \
             FROM code_changes WHERE $1 = ANY(files_modified) ORDER BY timestamp DESC",
        )
        .bind(file_path)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows)
    }

    /// Vector similarity search: fetches `top_k * 2` nearest by cosine
    /// distance, then filters to `min_score` — matches the original's
    /// over-fetch-then-filter shape rather than a `HAVING` clause.
    pub async fn semantic_search(
        &self,
        embedding: Vec<f32>,
        top_k: i64,
        min_score: f32,
    ) -> Result<Vec<SemanticSearchRow>> {
        let vector = Vector::from(embedding);
        let rows: Vec<SemanticSearchRow> = sqlx::query_as(
            "SELECT i.id, i.user_message, i.assistant_response, i.date, \
                    1 - (i.embedding <=> $1) AS score \
             FROM interactions i WHERE i.embedding IS NOT NULL \
             ORDER BY i.embedding <=> $1 LIMIT $2",
        )
        .bind(vector)
        .bind(top_k * 2)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().filter(|r| r.score >= min_score).take(top_k as usize).collect())
    }

    /// Interactions with no vector yet, oldest first — feeds the backfill
    /// admin endpoint (§6).
    pub async fn get_interactions_missing_embeddings(&self, limit: i64) -> Result<Vec<(Uuid, String)>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, user_message FROM interactions \
             WHERE embedding IS NULL ORDER BY timestamp LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows)
    }

    pub async fn update_interaction_embedding(&self, id: Uuid, embedding: Vec<f32>) -> Result<()> {
        sqlx::query("UPDATE interactions SET embedding = $1 WHERE id = $2")
            .bind(Vector::from(embedding))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    pub async fn store_trade_audit(&self, audit: &TradeAudit) -> Result<()> {
        sqlx::query(
            "INSERT INTO trade_audit (\
                trade_id, user_id, timestamp, symbol, action, quantity, price, \
                instrument_type, option_symbol, account, mode, order_id, status\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (trade_id) DO UPDATE SET \
                order_id = EXCLUDED.order_id, status = EXCLUDED.status",
        )
        .bind(&audit.trade_id)
        .bind(&audit.user_id)
        .bind(audit.timestamp)
        .bind(&audit.symbol)
        .bind(&audit.action)
        .bind(audit.quantity)
        .bind(audit.price)
        .bind(&audit.instrument_type)
        .bind(&audit.option_symbol)
        .bind(&audit.account)
        .bind(&audit.mode)
        .bind(&audit.order_id)
        .bind(&audit.status)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        const QUERIES: [(&str, &str); 7] = [
            ("users", "SELECT COUNT(*) FROM users"),
            ("interactions", "SELECT COUNT(*) FROM interactions"),
            ("concepts", "SELECT COUNT(*) FROM concepts"),
            ("daily_summaries", "SELECT COUNT(*) FROM daily_summaries"),
            ("weekly_summaries", "SELECT COUNT(*) FROM weekly_summaries"),
            ("monthly_summaries", "SELECT COUNT(*) FROM monthly_summaries"),
            ("code_changes", "SELECT COUNT(*) FROM code_changes"),
        ];
        let mut table_counts = Vec::with_capacity(QUERIES.len());
        for (table, query) in QUERIES {
            let count: (i64,) = sqlx::query_as(query).fetch_one(&self.pool).await.map_err(db_err)?;
            table_counts.push((table.to_string(), count.0));
        }

        let pgvector_version: Option<(String,)> =
            sqlx::query_as("SELECT extversion FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(HealthStatus {
            table_counts,
            pgvector_version: pgvector_version.map(|(v,)| v),
        })
    }
}

pub struct HealthStatus {
    pub table_counts: Vec<(String, i64)>,
    pub pgvector_version: Option<String>,
}

fn db_err(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn parse_week_id(week_id: &str) -> Result<(i32, i32)> {
    let (year, week) = week_id
        .split_once("-W")
        .ok_or_else(|| Error::Other(format!("invalid week_id: {week_id}")))?;
    let year: i32 = year.parse().map_err(|_| Error::Other(format!("invalid week_id: {week_id}")))?;
    let week: i32 = week.parse().map_err(|_| Error::Other(format!("invalid week_id: {week_id}")))?;
    Ok((year, week))
}

fn parse_month_id(month_id: &str) -> Result<(i32, i32)> {
    let (year, month) = month_id
        .split_once('-')
        .ok_or_else(|| Error::Other(format!("invalid month_id: {month_id}")))?;
    let year: i32 = year.parse().map_err(|_| Error::Other(format!("invalid month_id: {month_id}")))?;
    let month: i32 = month.parse().map_err(|_| Error::Other(format!("invalid month_id: {month_id}")))?;
    Ok((year, month))
}

/// Which table a concept link belongs to.
enum ConceptLink {
    Interaction(Uuid),
    CodeChange(Uuid),
}

async fn link_to_concept(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    link: ConceptLink,
    name: &str,
) -> Result<()> {
    let normalized = name.to_lowercase().replace(' ', "_");

    let (concept_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO concepts (name, normalized_name, mention_count) VALUES ($1, $2, 1) \
         ON CONFLICT (name) DO UPDATE SET mention_count = concepts.mention_count + 1 \
         RETURNING id",
    )
    .bind(name)
    .bind(&normalized)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_err)?;

    match link {
        ConceptLink::Interaction(id) => {
            sqlx::query(
                "INSERT INTO interaction_concepts (interaction_id, concept_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(concept_id)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        }
        ConceptLink::CodeChange(id) => {
            sqlx::query(
                "INSERT INTO code_change_concepts (change_id, concept_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(concept_id)
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        }
    }
    Ok(())
}

/// Derives concept names from modified file paths the way the original
/// turns `alex/memory/foo.py` into `{alex, memory, foo}`, dropping noise
/// segments.
fn extract_concepts_from_files(files: &[String]) -> Vec<String> {
    let mut concepts = std::collections::HashSet::new();
    for f in files {
        let cleaned = f.replace('/', ".").replace(".py", "").replace(".rs", "");
        for part in cleaned.split('.') {
            if !part.is_empty() && !matches!(part, "alex" | "tests" | "__init__" | "src" | "crates") {
                concepts.insert(part.to_string());
            }
        }
    }
    concepts.into_iter().collect()
}

// ── Row types ────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
struct InteractionRow {
    id: Uuid,
    user_id: String,
    date: NaiveDate,
    timestamp: DateTime<Utc>,
    user_message: String,
    assistant_response: String,
    intent: Option<String>,
    complexity_score: f32,
    model_used: Option<String>,
    embedding: Option<Vector>,
}

impl From<InteractionRow> for Interaction {
    fn from(r: InteractionRow) -> Self {
        Interaction {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            timestamp: r.timestamp,
            user_message: r.user_message,
            assistant_response: r.assistant_response,
            intent: r.intent,
            complexity_score: r.complexity_score,
            model_used: r.model_used,
            embedding: r.embedding.map(|v| v.to_vec()),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailySummaryRow {
    pub date: NaiveDate,
    pub content: String,
    pub key_topics: Vec<String>,
    pub interaction_count: i32,
    pub model_used: String,
    #[serde(skip)]
    pub embedding: Option<Vector>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WeeklySummaryRow {
    pub week_id: String,
    pub content: String,
    pub key_themes: Vec<String>,
    pub total_interactions: i32,
    pub model_used: String,
    #[serde(skip)]
    pub embedding: Option<Vector>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlySummaryRow {
    pub month_id: String,
    pub content: String,
    pub key_themes: Vec<String>,
    pub total_interactions: i32,
    pub model_used: String,
    #[serde(skip)]
    pub embedding: Option<Vector>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SemanticSearchRow {
    pub id: Uuid,
    pub user_message: String,
    pub assistant_response: String,
    pub date: NaiveDate,
    pub score: f32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CodeChangeRow {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub files_modified: Vec<String>,
    pub description: String,
    pub reasoning: String,
    pub change_type: String,
    pub commit_sha: Option<String>,
    pub related_interaction_id: Option<Uuid>,
}

impl From<CodeChangeRow> for CodeChange {
    fn from(r: CodeChangeRow) -> Self {
        let change_type = match r.change_type.as_str() {
            "bugfix" => ChangeType::Bugfix,
            "refactor" => ChangeType::Refactor,
            "test" => ChangeType::Test,
            "other" => ChangeType::Other,
            _ => ChangeType::Feature,
        };
        CodeChange {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            timestamp: r.timestamp,
            files_modified: r.files_modified,
            description: r.description,
            reasoning: r.reasoning,
            change_type,
            commit_sha: r.commit_sha,
            related_interaction_id: r.related_interaction_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_week_id() {
        assert_eq!(parse_week_id("2026-W04").unwrap(), (2026, 4));
        assert!(parse_week_id("garbage").is_err());
    }

    #[test]
    fn parses_month_id() {
        assert_eq!(parse_month_id("2026-7").unwrap(), (2026, 7));
    }

    #[test]
    fn extracts_concepts_from_file_paths() {
        let files = vec!["alex/memory/retriever.py".to_string()];
        let mut concepts = extract_concepts_from_files(&files);
        concepts.sort();
        assert_eq!(concepts, vec!["memory".to_string(), "retriever".to_string()]);
    }
}
