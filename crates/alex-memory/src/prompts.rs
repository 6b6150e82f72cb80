//! Per-tier summarization prompt templates (§4.4), matching the original's
//! literal instruction structure so the marker parsing contract in
//! [`crate::parse::parse_summary_response`] has a concrete producer to
//! round-trip against.

pub fn daily_summary_prompt(date: &str, interactions: &str) -> String {
    format!(
        "You are Alex's memory consolidation system. Summarize the following interactions from {date}.\n\n\
         INTERACTIONS:\n{interactions}\n\n\
         Create a concise summary (2-3 paragraphs) that captures:\n\
         1. Main topics discussed\n\
         2. Key decisions or conclusions reached\n\
         3. Any tasks or follow-ups mentioned\n\
         4. Notable technical concepts explored\n\n\
         Also extract 3-7 key topics as a comma-separated list.\n\n\
         Format your response as:\n\
         SUMMARY:\n[Your summary here]\n\n\
         KEY_TOPICS:\n[topic1, topic2, topic3, ...]\n"
    )
}

pub fn weekly_summary_prompt(week_id: &str, daily_summaries: &str) -> String {
    format!(
        "You are Alex's memory consolidation system. Create a weekly summary from the following daily summaries for week {week_id}.\n\n\
         DAILY SUMMARIES:\n{daily_summaries}\n\n\
         Create a thematic summary (3-4 paragraphs) that:\n\
         1. Identifies recurring themes across the week\n\
         2. Tracks progress on ongoing projects or discussions\n\
         3. Notes any shifts in focus or priorities\n\
         4. Highlights key achievements or milestones\n\n\
         Also extract 5-10 key themes as a comma-separated list.\n\n\
         Format your response as:\n\
         SUMMARY:\n[Your summary here]\n\n\
         KEY_THEMES:\n[theme1, theme2, theme3, ...]\n"
    )
}

pub fn monthly_summary_prompt(month_name: &str, year: i32, weekly_summaries: &str) -> String {
    format!(
        "You are Alex's memory consolidation system. Create a monthly summary from the following weekly summaries for {month_name} {year}.\n\n\
         WEEKLY SUMMARIES:\n{weekly_summaries}\n\n\
         Create a strategic summary (4-5 paragraphs) that:\n\
         1. Identifies major themes and patterns across the month\n\
         2. Tracks evolution of projects and priorities\n\
         3. Notes significant accomplishments\n\
         4. Suggests areas for future focus\n\n\
         Also extract 5-10 key themes as a comma-separated list.\n\n\
         Format your response as:\n\
         SUMMARY:\n[Your summary here]\n\n\
         KEY_THEMES:\n[theme1, theme2, theme3, ...]\n"
    )
}
