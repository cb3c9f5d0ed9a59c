//! In-memory catalog store for tests
//!
//! Mirrors the PostgreSQL schema closely enough to catch ordering bugs:
//! seasons need their series, episodes need their season, and a season id
//! change cascades to its episodes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::store::{CatalogStore, RecordBatch};
use crate::errors::StoreError;
use crate::models::{
    ChannelRecord, EpisodeRecord, LogoUpdate, LogoUpdateReport, MovieRecord, SeasonRecord,
    SeriesRecord, SyncCacheEntry,
};

#[derive(Debug, Default, Clone)]
pub struct Tables {
    pub channels: BTreeMap<String, ChannelRecord>,
    pub movies: BTreeMap<i64, MovieRecord>,
    pub series: BTreeMap<i64, SeriesRecord>,
    pub seasons: BTreeMap<(i64, i32), SeasonRecord>,
    pub episodes: BTreeMap<(i64, i64, i32), EpisodeRecord>,
    pub cache: HashMap<String, SyncCacheEntry>,
}

impl Tables {
    /// Upsert by (series_id, season_number) with the same id rules as the schema
    fn put_season(&mut self, season: SeasonRecord) {
        let key = (season.series_id, season.season_number);

        // Another row holding this id is deleted, episodes included
        let displaced: Vec<_> = self
            .seasons
            .iter()
            .filter(|(k, s)| **k != key && s.id == season.id)
            .map(|(k, _)| *k)
            .collect();
        for k in displaced {
            self.seasons.remove(&k);
            self.episodes.retain(|_, e| e.season_id != season.id);
        }

        // ON UPDATE CASCADE
        if let Some(old_id) = self.seasons.get(&key).map(|s| s.id) {
            if old_id != season.id {
                let moved: Vec<_> = self
                    .episodes
                    .keys()
                    .filter(|(_, season_id, _)| *season_id == old_id)
                    .copied()
                    .collect();
                for k in moved {
                    if let Some(mut episode) = self.episodes.remove(&k) {
                        episode.season_id = season.id;
                        self.episodes.insert((k.0, season.id, k.2), episode);
                    }
                }
            }
        }

        self.seasons.insert(key, season);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_relation: Mutex<Option<&'static str>>,
    batches: Mutex<Vec<(&'static str, usize)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `relation` fail with a constraint error
    pub fn fail_writes_to(&self, relation: &'static str) {
        *self.fail_relation.lock().unwrap() = Some(relation);
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }

    /// (relation, size) of every committed batch, in order
    pub fn batches(&self) -> Vec<(&'static str, usize)> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn upsert_batch(&self, batch: RecordBatch) -> Result<usize, StoreError> {
        let relation = batch.relation();
        if *self.fail_relation.lock().unwrap() == Some(relation) {
            return Err(StoreError::Constraint {
                relation: relation.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let count = batch.len();
        let mut guard = self.tables.lock().unwrap();
        // Apply to a copy and swap on success so a failed batch leaves no trace
        let mut staged = guard.clone();

        match batch {
            RecordBatch::Channels(records) => {
                for r in records {
                    staged.channels.insert(r.name.clone(), r);
                }
            }
            RecordBatch::Movies(records) => {
                for r in records {
                    staged.movies.insert(r.external_id, r);
                }
            }
            RecordBatch::Series(records) => {
                for r in records {
                    staged.series.insert(r.external_id, r);
                }
            }
            RecordBatch::Seasons(records) => {
                for r in records {
                    if !staged.series.contains_key(&r.series_id) {
                        return Err(StoreError::Constraint {
                            relation: relation.to_string(),
                            message: format!("series {} does not exist", r.series_id),
                        });
                    }
                    staged.put_season(r);
                }
            }
            RecordBatch::Episodes(records) => {
                for r in records {
                    let season_exists = staged
                        .seasons
                        .values()
                        .any(|s| s.id == r.season_id && s.series_id == r.series_id);
                    if !season_exists {
                        return Err(StoreError::Constraint {
                            relation: relation.to_string(),
                            message: format!("season {} does not exist", r.season_id),
                        });
                    }
                    staged
                        .episodes
                        .insert((r.series_id, r.season_id, r.episode_number), r);
                }
            }
        }

        *guard = staged;
        self.batches.lock().unwrap().push((relation, count));
        Ok(count)
    }

    async fn update_channel_logos(
        &self,
        updates: &[LogoUpdate],
    ) -> Result<LogoUpdateReport, StoreError> {
        if *self.fail_relation.lock().unwrap() == Some("channels") {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        let mut report = LogoUpdateReport::default();
        let mut tables = self.tables.lock().unwrap();
        for update in updates {
            match tables.channels.get_mut(&update.name) {
                Some(channel) => {
                    channel.logo_url = Some(update.logo_url.clone());
                    report.updated += 1;
                }
                None => report.not_found += 1,
            }
        }
        Ok(report)
    }

    async fn series_ids(&self, limit: usize) -> Result<Vec<i64>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut series: Vec<&SeriesRecord> = tables.series.values().collect();
        series.sort_by(|a, b| {
            b.popularity
                .total_cmp(&a.popularity)
                .then(a.external_id.cmp(&b.external_id))
        });
        Ok(series.into_iter().take(limit).map(|s| s.external_id).collect())
    }

    async fn get_cache_entry(&self, key: &str) -> Result<Option<SyncCacheEntry>, StoreError> {
        Ok(self.tables.lock().unwrap().cache.get(key).cloned())
    }

    async fn put_cache_entry(&self, entry: &SyncCacheEntry) -> Result<(), StoreError> {
        if *self.fail_relation.lock().unwrap() == Some("sync_cache") {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.tables
            .lock()
            .unwrap()
            .cache
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(id: i64, number: i32) -> SeasonRecord {
        SeasonRecord {
            id,
            series_id: 1,
            season_number: number,
            name: format!("Season {}", number),
            overview: String::new(),
            air_date: None,
            episode_count: 1,
            poster_path: None,
            vote_average: 0.0,
            image_urls: vec![],
        }
    }

    fn episode(season_id: i64, number: i32) -> EpisodeRecord {
        EpisodeRecord {
            id: season_id * 10 + number as i64,
            series_id: 1,
            season_id,
            episode_number: number,
            name: String::new(),
            overview: String::new(),
            air_date: None,
            runtime: 0,
            still_path: None,
            vote_average: 0.0,
            vote_count: 0,
            image_urls: vec![],
        }
    }

    #[test]
    fn test_changed_season_id_cascades_to_episodes() {
        let mut tables = Tables::default();
        tables.put_season(season(100, 1));
        tables.episodes.insert((1, 100, 1), episode(100, 1));

        tables.put_season(season(150, 1));

        assert_eq!(tables.seasons[&(1, 1)].id, 150);
        assert_eq!(tables.episodes[&(1, 150, 1)].season_id, 150);
        assert!(!tables.episodes.contains_key(&(1, 100, 1)));
    }

    #[test]
    fn test_season_id_taken_by_another_number_replaces_it() {
        let mut tables = Tables::default();
        tables.put_season(season(100, 1));
        tables.episodes.insert((1, 100, 1), episode(100, 1));

        tables.put_season(season(100, 2));

        assert!(!tables.seasons.contains_key(&(1, 1)));
        assert_eq!(tables.seasons[&(1, 2)].id, 100);
        assert!(tables.episodes.is_empty());
    }
}
