use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::usecases::scheduled_runner::ScheduledRunner;

/// Ticks the runner every `interval` until the process stops. The first tick fires
/// immediately so seeds that came due while the worker was down are not held back.
pub async fn run_scheduler_loop(runner: Arc<ScheduledRunner>, interval: Duration) -> anyhow::Result<()> {
    info!(interval_secs = interval.as_secs(), "scheduler_loop: started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if let Err(err) = runner.tick(Utc::now()).await {
            error!(error = ?err, "scheduler_loop: tick failed");
        }
    }
}
