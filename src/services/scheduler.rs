//! Periodic catalog sync
//!
//! Runs as a background task on startup, then periodically:
//! - each tick calls `sync_if_stale`, so a fresh catalog costs one cache read
//! - stops when the shutdown token is cancelled; the synchronizer shares
//!   a child of that token

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::errors::SyncError;
use crate::models::SyncOutcome;
use crate::services::synchronizer::CatalogSynchronizer;

/// Configuration for the sync scheduler
pub struct SchedulerConfig {
    /// How often to check staleness (in seconds)
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600, // Check every hour
        }
    }
}

/// Run a single scheduled check
async fn run_tick(synchronizer: &CatalogSynchronizer) {
    match synchronizer.sync_if_stale().await {
        Ok(SyncOutcome::Completed { report, .. }) => {
            tracing::info!(
                "Scheduled sync completed ({} movies, {} series, {} failures)",
                report.movies,
                report.series,
                report.failures.len()
            );
        }
        Ok(SyncOutcome::Skipped { .. }) => {
            tracing::debug!("Scheduled sync skipped, catalog is fresh");
        }
        Err(SyncError::Cancelled) => {
            tracing::info!("Scheduled sync cancelled");
        }
        Err(e) => {
            // Cache was not written, the next tick retries the whole sync
            tracing::error!("Scheduled sync failed: {}", e);
        }
    }
}

/// Start the background sync task
///
/// Runs immediately on startup, then at the configured interval.
/// This should be spawned as a background task using `tokio::spawn`.
pub async fn start_sync_task(
    synchronizer: Arc<CatalogSynchronizer>,
    config: SchedulerConfig,
    shutdown: CancellationToken,
) {
    tracing::info!("Starting sync scheduler (interval: {}s)", config.interval_secs);

    let mut interval = time::interval(Duration::from_secs(config.interval_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        // A running sync stops at its next loop boundary once cancelled
        run_tick(&synchronizer).await;
    }

    tracing::info!("Sync scheduler stopped");
}
