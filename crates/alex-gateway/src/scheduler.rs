//! Background tick that sweeps pending summarization work, grounded on
//! `sa_gateway::runtime::schedule_runner::ScheduleRunner`'s periodic-tick
//! shape but driving the three-tier summarizer instead of cron schedules.

use std::time::Duration;

use crate::state::AppState;

const TICK_INTERVAL: Duration = Duration::from_secs(300);
const DAY_BATCH: i64 = 30;
const WEEK_BATCH: i64 = 12;
const MONTH_BATCH: i64 = 6;

pub fn spawn(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            match state.summarizer.summarize_all_pending(DAY_BATCH, WEEK_BATCH, MONTH_BATCH).await {
                Ok(report) if report.days_completed + report.weeks_completed + report.months_completed > 0 => {
                    tracing::info!(
                        days = report.days_completed,
                        weeks = report.weeks_completed,
                        months = report.months_completed,
                        failures = report.failures,
                        "scheduled summarization tick completed"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "scheduled summarization tick failed"),
            }
        }
    });
}
