/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/refresh.rs
 * Responsibility: The weekly problem-cache refresh heartbeat
 */

use crate::AppState;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Sunday midnight, seconds-first cron notation.
const WEEKLY_REFRESH_CRON: &str = "0 0 0 * * Sun";

static STARTED: AtomicBool = AtomicBool::new(false);
static SCHEDULER: Lazy<Arc<RwLock<Option<JobScheduler>>>> =
    Lazy::new(|| Arc::new(RwLock::new(None)));

/// Start the weekly refresh job. Idempotent: the gateway may fire `ready`
/// more than once per process, the job is only scheduled on the first call.
pub async fn start_weekly_refresh(state: Arc<AppState>) -> anyhow::Result<()> {
    if STARTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let sched = JobScheduler::new().await?;
    let job = Job::new_async(WEEKLY_REFRESH_CRON, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            info!("weekly problem cache refresh starting");
            match state.problems.refresh_all().await {
                Ok(stored) => info!("weekly cache refresh finished, {stored} problems stored"),
                Err(err) => error!("weekly cache refresh failed: {err}"),
            }
        })
    })?;
    sched.add(job).await?;
    sched.start().await?;
    info!("weekly cache refresh scheduled ({WEEKLY_REFRESH_CRON})");

    // Keep the scheduler alive for the lifetime of the process.
    let mut lock = SCHEDULER.write().await;
    *lock = Some(sched);
    Ok(())
}
