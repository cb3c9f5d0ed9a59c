//! Catalog synchronizer
//!
//! Drives the full sync: trending and popular titles (mandatory), then
//! per-genre discovery and per-series season/episode detail (best effort).
//!
//! ```text
//! Idle -> Movies -> Series -> Genres -> Details -> Idle
//! ```
//!
//! Only one sync runs at a time per synchronizer. A conditional trigger that
//! waited on a running sync re-checks the cache before doing any work.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::CatalogStore;
use crate::errors::{StoreError, SyncError};
use crate::models::{CatalogItem, MediaKind, SyncOutcome, SyncPhase, SyncReport};
use crate::services::metrics;
use crate::services::normalize::Normalizer;
use crate::services::reconciler::BatchReconciler;
use crate::services::sync_cache::{Clock, StalenessCache, LAST_SYNC_KEY};
use crate::services::tmdb::{CatalogSource, RemoteTitles};

/// Enrichment policy of a full sync
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    /// Genres discovered for both movies and series
    pub genres: Vec<i64>,
    /// Stored series that get season/episode detail
    pub series_detail_limit: usize,
    /// Series detailed concurrently (1 = sequential)
    pub detail_concurrency: usize,
}

impl SyncPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            genres: config.sync_genres.clone(),
            series_detail_limit: config.series_detail_limit,
            detail_concurrency: config.detail_concurrency.max(1),
        }
    }
}

/// Resets the published phase when a sync ends, however it ends
struct PhaseGuard<'a>(&'a watch::Sender<SyncPhase>);

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(SyncPhase::Idle);
    }
}

/// Orchestrates remote fetches, normalization and reconciliation
pub struct CatalogSynchronizer {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn CatalogStore>,
    reconciler: BatchReconciler<dyn CatalogStore>,
    cache: StalenessCache<dyn CatalogStore>,
    normalizer: Normalizer,
    policy: SyncPolicy,
    running: Mutex<()>,
    phase: watch::Sender<SyncPhase>,
    cancel: CancellationToken,
}

impl CatalogSynchronizer {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
        normalizer: Normalizer,
        policy: SyncPolicy,
        cancel: CancellationToken,
    ) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);

        Self {
            source,
            reconciler: BatchReconciler::new(Arc::clone(&store)),
            cache: StalenessCache::new(Arc::clone(&store), clock),
            store,
            normalizer,
            policy,
            running: Mutex::new(()),
            phase,
            cancel,
        }
    }

    /// Current phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    /// Run a full sync unless the last one is younger than the TTL
    pub async fn sync_if_stale(&self) -> Result<SyncOutcome, SyncError> {
        if let Some(entry) = self.cache.get_fresh(LAST_SYNC_KEY).await? {
            info!("Catalog is fresh (last sync at {}), skipping", entry.timestamp);
            metrics::record_sync("conditional", "skipped");
            return Ok(SyncOutcome::Skipped {
                last_sync: entry.timestamp,
            });
        }

        let _running = self.running.lock().await;

        // A sync may have completed while we waited for the lock
        if let Some(entry) = self.cache.get_fresh(LAST_SYNC_KEY).await? {
            info!("Catalog was synced concurrently at {}, skipping", entry.timestamp);
            metrics::record_sync("conditional", "skipped");
            return Ok(SyncOutcome::Skipped {
                last_sync: entry.timestamp,
            });
        }

        self.run_and_record("conditional").await
    }

    /// Run a full sync regardless of the cache, then refresh it
    pub async fn force_sync(&self) -> Result<SyncOutcome, SyncError> {
        let _running = self.running.lock().await;
        self.run_and_record("forced").await
    }

    /// Run the sync workflow without touching the cache
    pub async fn perform_full_sync(&self) -> Result<SyncReport, SyncError> {
        let _running = self.running.lock().await;
        self.full_sync().await
    }

    async fn run_and_record(&self, mode: &str) -> Result<SyncOutcome, SyncError> {
        let report = match self.full_sync().await {
            Ok(report) => report,
            Err(e) => {
                error!("Catalog sync ({}) failed: {}", mode, e);
                let outcome = if matches!(e, SyncError::Cancelled) {
                    "cancelled"
                } else {
                    "failed"
                };
                metrics::record_sync(mode, outcome);
                return Err(e);
            }
        };

        let payload = serde_json::to_value(&report).map_err(StoreError::from)?;
        let entry = self.cache.put(LAST_SYNC_KEY, payload).await?;

        metrics::record_sync(mode, "completed");
        info!(
            "Catalog sync ({}) completed: {} movies, {} series, {} genres, {} series detailed, {} failures",
            mode,
            report.movies,
            report.series,
            report.genres_synced,
            report.series_detailed,
            report.failures.len()
        );

        Ok(SyncOutcome::Completed {
            finished_at: entry.timestamp,
            report,
        })
    }

    /// The workflow itself; callers hold `running`
    async fn full_sync(&self) -> Result<SyncReport, SyncError> {
        let _phase = PhaseGuard(&self.phase);
        let mut report = SyncReport::default();

        // Mandatory phases: any failure aborts the sync
        self.phase.send_replace(SyncPhase::Movies);
        let trending = self.source.fetch_trending(MediaKind::Movie).await?;
        report.movies += self.upsert_titles(&trending).await?;
        let popular = self.source.fetch_popular(MediaKind::Movie).await?;
        report.movies += self.upsert_titles(&popular).await?;

        self.phase.send_replace(SyncPhase::Series);
        let trending = self.source.fetch_trending(MediaKind::Series).await?;
        report.series += self.upsert_titles(&trending).await?;
        let popular = self.source.fetch_popular(MediaKind::Series).await?;
        report.series += self.upsert_titles(&popular).await?;

        // Enrichment: remote failures are isolated per unit
        self.phase.send_replace(SyncPhase::Genres);
        for &genre_id in &self.policy.genres {
            self.check_cancelled()?;

            match self.sync_genre(genre_id).await {
                Ok((movies, series)) => {
                    report.movies += movies;
                    report.series += series;
                    report.genres_synced += 1;
                }
                Err(SyncError::Remote(e)) => {
                    warn!("Skipping genre {}: {}", genre_id, e);
                    metrics::record_enrichment_failure("genre");
                    report.failures.push(format!("genre:{}", genre_id));
                }
                Err(e) => return Err(e),
            }
        }

        self.phase.send_replace(SyncPhase::Details);
        self.check_cancelled()?;
        let series_ids = self.store.series_ids(self.policy.series_detail_limit).await?;

        // Once stopped, no new series starts; units in flight run to completion
        let stop = self.cancel.child_token();
        let mut details = stream::iter(series_ids)
            .take_while(|_| future::ready(!stop.is_cancelled()))
            .map(|series_id| async move { (series_id, self.sync_series_details(series_id).await) })
            .buffer_unordered(self.policy.detail_concurrency);

        let mut fatal = None;
        while let Some((series_id, result)) = details.next().await {
            match result {
                Ok((seasons, episodes)) => {
                    report.series_detailed += 1;
                    report.seasons += seasons;
                    report.episodes += episodes;
                }
                Err(SyncError::Remote(e)) => {
                    warn!("Skipping details for series {}: {}", series_id, e);
                    metrics::record_enrichment_failure("series_detail");
                    report.failures.push(format!("series:{}", series_id));
                }
                Err(e) => {
                    stop.cancel();
                    fatal.get_or_insert(e);
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }
        self.check_cancelled()?;

        Ok(report)
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            warn!("Catalog sync cancelled; committed batches are kept");
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    /// Normalize a listing and upsert it; returns (movies + series) written
    async fn upsert_titles(&self, titles: &RemoteTitles) -> Result<usize, StoreError> {
        if titles.is_empty() {
            tracing::debug!("Remote listing was empty");
            return Ok(0);
        }

        let mut movies = Vec::new();
        let mut series = Vec::new();
        for item in self.normalizer.titles(titles) {
            match item {
                CatalogItem::Movie(m) => movies.push(m),
                CatalogItem::Series(s) => series.push(s),
            }
        }

        let written = self.reconciler.upsert_batch(movies).await?
            + self.reconciler.upsert_batch(series).await?;
        Ok(written)
    }

    /// Discover one genre for movies then series
    async fn sync_genre(&self, genre_id: i64) -> Result<(usize, usize), SyncError> {
        let movies = self.source.fetch_by_genre(MediaKind::Movie, genre_id).await?;
        let movies = self.upsert_titles(&movies).await?;

        let series = self.source.fetch_by_genre(MediaKind::Series, genre_id).await?;
        let series = self.upsert_titles(&series).await?;

        tracing::debug!("Genre {}: {} movies, {} series", genre_id, movies, series);

        Ok((movies, series))
    }

    /// Fetch and store every regular season of a stored series; returns (seasons, episodes)
    async fn sync_series_details(&self, series_id: i64) -> Result<(usize, usize), SyncError> {
        let details = self.source.fetch_series_details(series_id).await?;
        let mut seasons = 0;
        let mut episodes = 0;

        // Season 0 holds specials
        for summary in details.seasons.iter().filter(|s| s.season_number != 0) {
            let raw = self
                .source
                .fetch_season_details(series_id, summary.season_number)
                .await?;

            let season = self.normalizer.season(series_id, &raw, summary.episode_count);
            let season_id = season.id;
            seasons += self.reconciler.upsert_batch(vec![season]).await?;

            let records = raw
                .episodes
                .iter()
                .map(|e| self.normalizer.episode(series_id, season_id, e))
                .collect();
            episodes += self.reconciler.upsert_batch(records).await?;
        }

        tracing::debug!(
            "Series {} ({}): {} seasons, {} episodes",
            series_id,
            details.name.as_deref().unwrap_or("untitled"),
            seasons,
            episodes
        );

        Ok((seasons, episodes))
    }
}
