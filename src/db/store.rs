//! Catalog store abstraction
//!
//! The workflows only see [`CatalogStore`]; [`PgCatalogStore`] is the
//! PostgreSQL implementation used by the server.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::models::{NewChannel, NewEpisode, NewMovie, NewSeason, NewSeries};
use crate::db::repository;
use crate::errors::StoreError;
use crate::models::{
    ChannelRecord, EpisodeRecord, LogoUpdate, LogoUpdateReport, MovieRecord, SeasonRecord,
    SeriesRecord, SyncCacheEntry,
};

/// Records of one relation written together
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    Channels(Vec<ChannelRecord>),
    Movies(Vec<MovieRecord>),
    Series(Vec<SeriesRecord>),
    Seasons(Vec<SeasonRecord>),
    Episodes(Vec<EpisodeRecord>),
}

impl RecordBatch {
    /// Target relation name
    pub fn relation(&self) -> &'static str {
        match self {
            RecordBatch::Channels(_) => "channels",
            RecordBatch::Movies(_) => "movies",
            RecordBatch::Series(_) => "tv_series",
            RecordBatch::Seasons(_) => "seasons",
            RecordBatch::Episodes(_) => "episodes",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Channels(v) => v.len(),
            RecordBatch::Movies(v) => v.len(),
            RecordBatch::Series(v) => v.len(),
            RecordBatch::Seasons(v) => v.len(),
            RecordBatch::Episodes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persistent catalog storage
///
/// Every write method is all-or-nothing: either the whole batch is applied
/// or none of it is.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Upsert a batch by natural key; returns the number of records written
    async fn upsert_batch(&self, batch: RecordBatch) -> Result<usize, StoreError>;

    /// Update logos of channels that already exist, matched by name.
    /// `skipped_no_logo` is left at zero for the caller to fill.
    async fn update_channel_logos(
        &self,
        updates: &[LogoUpdate],
    ) -> Result<LogoUpdateReport, StoreError>;

    /// Stored series ids, most popular first
    async fn series_ids(&self, limit: usize) -> Result<Vec<i64>, StoreError>;

    async fn get_cache_entry(&self, key: &str) -> Result<Option<SyncCacheEntry>, StoreError>;

    async fn put_cache_entry(&self, entry: &SyncCacheEntry) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn upsert_batch(&self, batch: RecordBatch) -> Result<usize, StoreError> {
        let count = batch.len();
        if batch.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;

        match &batch {
            RecordBatch::Channels(records) => {
                let rows: Vec<_> = records.iter().map(NewChannel::from_record).collect();
                repository::channels::upsert_many(&mut tx, &rows).await?;
            }
            RecordBatch::Movies(records) => {
                let rows: Vec<_> = records.iter().map(NewMovie::from_record).collect();
                repository::movies::upsert_many(&mut tx, &rows).await?;
            }
            RecordBatch::Series(records) => {
                let rows: Vec<_> = records.iter().map(NewSeries::from_record).collect();
                repository::series::upsert_many(&mut tx, &rows).await?;
            }
            RecordBatch::Seasons(records) => {
                let rows: Vec<_> = records.iter().map(NewSeason::from_record).collect();
                repository::seasons::upsert_many(&mut tx, &rows).await?;
            }
            RecordBatch::Episodes(records) => {
                let rows: Vec<_> = records.iter().map(NewEpisode::from_record).collect();
                repository::episodes::upsert_many(&mut tx, &rows).await?;
            }
        }

        // Dropping the transaction on an early return rolls it back
        tx.commit().await?;

        tracing::debug!("Committed {} rows into {}", count, batch.relation());

        Ok(count)
    }

    async fn update_channel_logos(
        &self,
        updates: &[LogoUpdate],
    ) -> Result<LogoUpdateReport, StoreError> {
        let mut report = LogoUpdateReport::default();
        let mut tx = self.pool.begin().await?;

        for update in updates {
            if repository::channels::update_logo(&mut tx, update).await? {
                report.updated += 1;
            } else {
                tracing::debug!("No stored channel named {:?}", update.name);
                report.not_found += 1;
            }
        }

        tx.commit().await?;

        Ok(report)
    }

    async fn series_ids(&self, limit: usize) -> Result<Vec<i64>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(repository::series::list_ids(&self.pool, limit).await?)
    }

    async fn get_cache_entry(&self, key: &str) -> Result<Option<SyncCacheEntry>, StoreError> {
        match repository::sync_cache::get(&self.pool, key).await? {
            Some(row) => Ok(Some(row.into_entry()?)),
            None => Ok(None),
        }
    }

    async fn put_cache_entry(&self, entry: &SyncCacheEntry) -> Result<(), StoreError> {
        let data = serde_json::to_string(&entry.payload)?;
        repository::sync_cache::put(&self.pool, &entry.key, entry.timestamp, &data).await?;
        Ok(())
    }
}
