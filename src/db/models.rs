//! Database row types for PostgreSQL
//!
//! List-valued record fields are stored comma-joined; `New*` types carry the
//! flattened values ready for binding.

use chrono::NaiveDate;
use sqlx::FromRow;

use crate::models::{
    ChannelRecord, EpisodeRecord, MovieRecord, SeasonRecord, SeriesRecord, SyncCacheEntry,
};

// ============================================================================
// Database Row Types
// ============================================================================

/// Sync cache row from database
#[derive(Debug, Clone, FromRow)]
pub struct SyncCacheRow {
    pub key: String,
    pub timestamp: i64,
    pub data: Option<String>,
}

impl SyncCacheRow {
    /// Convert to a cache entry; an empty or missing payload becomes `null`
    pub fn into_entry(self) -> Result<SyncCacheEntry, serde_json::Error> {
        let payload = match self.data.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
            _ => serde_json::Value::Null,
        };

        Ok(SyncCacheEntry {
            key: self.key,
            timestamp: self.timestamp,
            payload,
        })
    }
}

// ============================================================================
// Insert Types
// ============================================================================

/// Channel ready for upsert
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub logo_path: Option<String>,
    pub category: Option<String>,
    pub image_urls: String,
}

impl NewChannel {
    pub fn from_record(record: &ChannelRecord) -> Self {
        Self {
            name: record.name.clone(),
            logo_path: record.logo_url.clone(),
            category: record.category.clone(),
            image_urls: record.logo_url.clone().unwrap_or_default(),
        }
    }
}

/// Movie ready for upsert
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub genre_ids: String,
    pub adult: bool,
    pub original_language: String,
    pub original_title: String,
    pub popularity: f64,
    pub video: bool,
    pub image_urls: String,
}

impl NewMovie {
    pub fn from_record(record: &MovieRecord) -> Self {
        Self {
            id: record.external_id,
            title: record.title.clone(),
            overview: record.overview.clone(),
            poster_path: record.poster_path.clone(),
            backdrop_path: record.backdrop_path.clone(),
            release_date: record.release_date,
            vote_average: record.vote_average,
            vote_count: record.vote_count,
            genre_ids: join_list(&record.genre_ids),
            adult: record.adult,
            original_language: record.original_language.clone(),
            original_title: record.original_title.clone(),
            popularity: record.popularity,
            video: record.video,
            image_urls: join_list(&record.image_urls),
        }
    }
}

/// Series ready for upsert
#[derive(Debug, Clone)]
pub struct NewSeries {
    pub id: i64,
    pub name: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub genre_ids: String,
    pub adult: bool,
    pub original_language: String,
    pub original_name: String,
    pub popularity: f64,
    pub origin_country: String,
    pub image_urls: String,
}

impl NewSeries {
    pub fn from_record(record: &SeriesRecord) -> Self {
        Self {
            id: record.external_id,
            name: record.name.clone(),
            overview: record.overview.clone(),
            poster_path: record.poster_path.clone(),
            backdrop_path: record.backdrop_path.clone(),
            first_air_date: record.first_air_date,
            vote_average: record.vote_average,
            vote_count: record.vote_count,
            genre_ids: join_list(&record.genre_ids),
            adult: record.adult,
            original_language: record.original_language.clone(),
            original_name: record.original_name.clone(),
            popularity: record.popularity,
            origin_country: join_list(&record.origin_country),
            image_urls: join_list(&record.image_urls),
        }
    }
}

/// Season ready for upsert
#[derive(Debug, Clone)]
pub struct NewSeason {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    pub name: String,
    pub overview: String,
    pub air_date: Option<NaiveDate>,
    pub episode_count: i32,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub image_urls: String,
}

impl NewSeason {
    pub fn from_record(record: &SeasonRecord) -> Self {
        Self {
            id: record.id,
            series_id: record.series_id,
            season_number: record.season_number,
            name: record.name.clone(),
            overview: record.overview.clone(),
            air_date: record.air_date,
            episode_count: record.episode_count,
            poster_path: record.poster_path.clone(),
            vote_average: record.vote_average,
            image_urls: join_list(&record.image_urls),
        }
    }
}

/// Episode ready for upsert
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub id: i64,
    pub series_id: i64,
    pub season_id: i64,
    pub episode_number: i32,
    pub name: String,
    pub overview: String,
    pub air_date: Option<NaiveDate>,
    pub runtime: i32,
    pub still_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub image_urls: String,
}

impl NewEpisode {
    pub fn from_record(record: &EpisodeRecord) -> Self {
        Self {
            id: record.id,
            series_id: record.series_id,
            season_id: record.season_id,
            episode_number: record.episode_number,
            name: record.name.clone(),
            overview: record.overview.clone(),
            air_date: record.air_date,
            runtime: record.runtime,
            still_path: record.still_path.clone(),
            vote_average: record.vote_average,
            vote_count: record.vote_count,
            image_urls: join_list(&record.image_urls),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Flatten a list column: `[28, 12]` -> `"28,12"`, `[]` -> `""`
pub fn join_list<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
