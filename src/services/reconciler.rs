//! Batch reconciler
//!
//! Idempotent insert-or-update of normalized records by natural key. Each call
//! is one atomic store write; an empty batch never reaches the store.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::db::{CatalogStore, RecordBatch};
use crate::errors::StoreError;
use crate::models::{ChannelRecord, EpisodeRecord, MovieRecord, SeasonRecord, SeriesRecord};
use crate::services::metrics;

/// Upsert identity of a record
pub trait NaturalKey {
    type Key: Eq + Hash + Debug;

    fn natural_key(&self) -> Self::Key;
}

/// A record type the reconciler can write
pub trait Reconcile: NaturalKey + Sized + Send {
    fn into_batch(records: Vec<Self>) -> RecordBatch;
}

impl NaturalKey for ChannelRecord {
    type Key = String;

    fn natural_key(&self) -> String {
        self.name.clone()
    }
}

impl Reconcile for ChannelRecord {
    fn into_batch(records: Vec<Self>) -> RecordBatch {
        RecordBatch::Channels(records)
    }
}

impl NaturalKey for MovieRecord {
    type Key = i64;

    fn natural_key(&self) -> i64 {
        self.external_id
    }
}

impl Reconcile for MovieRecord {
    fn into_batch(records: Vec<Self>) -> RecordBatch {
        RecordBatch::Movies(records)
    }
}

impl NaturalKey for SeriesRecord {
    type Key = i64;

    fn natural_key(&self) -> i64 {
        self.external_id
    }
}

impl Reconcile for SeriesRecord {
    fn into_batch(records: Vec<Self>) -> RecordBatch {
        RecordBatch::Series(records)
    }
}

impl NaturalKey for SeasonRecord {
    type Key = (i64, i32);

    fn natural_key(&self) -> (i64, i32) {
        (self.series_id, self.season_number)
    }
}

impl Reconcile for SeasonRecord {
    fn into_batch(records: Vec<Self>) -> RecordBatch {
        RecordBatch::Seasons(records)
    }
}

impl NaturalKey for EpisodeRecord {
    type Key = (i64, i64, i32);

    fn natural_key(&self) -> (i64, i64, i32) {
        (self.series_id, self.season_id, self.episode_number)
    }
}

impl Reconcile for EpisodeRecord {
    fn into_batch(records: Vec<Self>) -> RecordBatch {
        RecordBatch::Episodes(records)
    }
}

/// Collapse records sharing a key to the last occurrence, keeping first-seen order
pub fn dedupe_last_wins<R: NaturalKey>(records: Vec<R>) -> Vec<R> {
    let mut slots: HashMap<R::Key, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<R> = Vec::with_capacity(records.len());

    for record in records {
        match slots.get(&record.natural_key()) {
            Some(&idx) => out[idx] = record,
            None => {
                slots.insert(record.natural_key(), out.len());
                out.push(record);
            }
        }
    }

    out
}

/// Writes batches through a [`CatalogStore`]
pub struct BatchReconciler<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for BatchReconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CatalogStore + ?Sized> BatchReconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Upsert `records` in one atomic pass; returns the number written
    ///
    /// On conflict every non-key column takes the incoming value.
    pub async fn upsert_batch<R: Reconcile>(&self, records: Vec<R>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let received = records.len();
        let records = dedupe_last_wins(records);
        if records.len() < received {
            tracing::debug!(
                "Collapsed {} duplicate key(s) in batch",
                received - records.len()
            );
        }

        let batch = R::into_batch(records);
        let relation = batch.relation();
        let written = self.store.upsert_batch(batch).await?;

        metrics::record_reconciled(relation, written);
        tracing::debug!("Reconciled {} {} record(s)", written, relation);

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn channel(name: &str, logo: Option<&str>) -> ChannelRecord {
        ChannelRecord {
            name: name.to_string(),
            logo_url: logo.map(str::to_string),
            category: Some("CANAIS ABERTOS".to_string()),
        }
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence_in_first_position() {
        let records = vec![
            channel("Globo", Some("a.png")),
            channel("SBT", None),
            channel("Globo", Some("b.png")),
        ];
        let deduped = dedupe_last_wins(records);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, "Globo");
        assert_eq!(deduped[0].logo_url.as_deref(), Some("b.png"));
        assert_eq!(deduped[1].name, "SBT");
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = BatchReconciler::new(store.clone());
        let written = reconciler
            .upsert_batch(Vec::<ChannelRecord>::new())
            .await
            .unwrap();
        assert_eq!(written, 0);
        assert!(store.batches().is_empty());
    }

    #[tokio::test]
    async fn test_second_upsert_overwrites() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = BatchReconciler::new(store.clone());

        reconciler
            .upsert_batch(vec![channel("Globo", Some("old.png"))])
            .await
            .unwrap();
        reconciler
            .upsert_batch(vec![channel("Globo", Some("new.png"))])
            .await
            .unwrap();

        let tables = store.snapshot();
        assert_eq!(tables.channels.len(), 1);
        assert_eq!(
            tables.channels["Globo"].logo_url.as_deref(),
            Some("new.png")
        );
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let reconciler = BatchReconciler::new(store.clone());

        // Season for a series that was never stored violates the parent key
        let orphan = SeasonRecord {
            id: 1,
            series_id: 42,
            season_number: 1,
            name: String::new(),
            overview: String::new(),
            air_date: None,
            episode_count: 0,
            poster_path: None,
            vote_average: 0.0,
            image_urls: vec![],
        };
        let err = reconciler.upsert_batch(vec![orphan]).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));
        assert!(store.snapshot().seasons.is_empty());
    }

    #[test]
    fn test_natural_keys() {
        let ep = EpisodeRecord {
            id: 7,
            series_id: 1,
            season_id: 2,
            episode_number: 3,
            name: String::new(),
            overview: String::new(),
            air_date: None,
            runtime: 0,
            still_path: None,
            vote_average: 0.0,
            vote_count: 0,
            image_urls: vec![],
        };
        assert_eq!(ep.natural_key(), (1, 2, 3));
        assert_eq!(channel("  x", None).natural_key(), "  x");
    }
}
