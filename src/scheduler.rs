//! Background reporting jobs. Both only read and log.

use std::time::Duration;

use time::{OffsetDateTime, Time};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCommentReport {
    pub total_comments: i64,
    pub commenting_users: i64,
    pub total_users: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentCoverage {
    pub recipes_with_comments: i64,
    pub visible_recipes: i64,
    pub total_comments: i64,
    pub coverage_percentage: f64,
}

pub async fn daily_comment_report(st: &AppState) -> AppResult<DailyCommentReport> {
    Ok(DailyCommentReport {
        total_comments: st.comments.count().await?,
        commenting_users: st.comments.count_distinct_authors().await?,
        total_users: st.users.count().await?,
    })
}

pub async fn comment_coverage(st: &AppState) -> AppResult<CommentCoverage> {
    let recipes_with_comments = st.comments.count_distinct_recipes().await?;
    let visible_recipes = st.recipes.count_public_visible().await?;
    let coverage_percentage = if visible_recipes == 0 {
        0.0
    } else {
        recipes_with_comments as f64 * 100.0 / visible_recipes as f64
    };
    Ok(CommentCoverage {
        recipes_with_comments,
        visible_recipes,
        total_comments: st.comments.count().await?,
        coverage_percentage,
    })
}

/// Time left until the next `at` (UTC), today or tomorrow.
pub fn delay_until(now: OffsetDateTime, at: Time) -> Duration {
    let mut next = now.replace_time(at);
    if next <= now {
        next += time::Duration::days(1);
    }
    let secs = (next - now).whole_seconds().max(0) as u64;
    Duration::from_secs(secs)
}

async fn run_daily_report(st: &AppState) {
    match daily_comment_report(st).await {
        Ok(r) => info!(
            total_comments = r.total_comments,
            commenting_users = r.commenting_users,
            total_users = r.total_users,
            "daily comment report"
        ),
        Err(e) => error!(error = %e, "daily comment report failed"),
    }
}

async fn run_coverage(st: &AppState) {
    match comment_coverage(st).await {
        Ok(c) => info!(
            recipes_with_comments = c.recipes_with_comments,
            visible_recipes = c.visible_recipes,
            total_comments = c.total_comments,
            coverage_pct = c.coverage_percentage,
            "comment coverage analysis"
        ),
        Err(e) => error!(error = %e, "comment coverage analysis failed"),
    }
}

/// Spawns both jobs. The caller aborts the handles on shutdown.
pub fn spawn(st: AppState) -> Vec<JoinHandle<()>> {
    let cfg = st.config.scheduler.clone();
    if !cfg.enabled {
        info!("scheduler disabled");
        return Vec::new();
    }

    let (report_at, every) = (cfg.daily_report_at, cfg.coverage_interval);
    let daily_state = st.clone();
    let daily = tokio::spawn(async move {
        loop {
            let wait = delay_until(OffsetDateTime::now_utc(), report_at);
            tokio::time::sleep(wait).await;
            run_daily_report(&daily_state).await;
        }
    });

    let coverage = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            run_coverage(&st).await;
        }
    });

    vec![daily, coverage]
}
