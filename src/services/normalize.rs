//! Remote payload normalization
//!
//! Applied to every remote item before it reaches the reconciler:
//! - `image_urls` = image base + path, poster then backdrop, empty paths skipped
//! - empty or unparseable dates become `None`
//! - missing booleans become `false`, missing numbers `0`, missing text `""`

use chrono::NaiveDate;

use crate::models::{CatalogItem, EpisodeRecord, MovieRecord, SeasonRecord, SeriesRecord};
use crate::services::tmdb::{
    RemoteTitles, TmdbEpisode, TmdbMovie, TmdbSeasonDetails, TmdbSeries,
};

/// Converts remote payloads into storable records
#[derive(Debug, Clone)]
pub struct Normalizer {
    image_base_url: String,
}

impl Normalizer {
    pub fn new(image_base_url: &str) -> Self {
        Self {
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute image URLs for the non-empty paths, in the given order
    pub fn image_urls(&self, paths: &[Option<&str>]) -> Vec<String> {
        paths
            .iter()
            .flatten()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| {
                if p.starts_with('/') {
                    format!("{}{}", self.image_base_url, p)
                } else {
                    format!("{}/{}", self.image_base_url, p)
                }
            })
            .collect()
    }

    pub fn movie(&self, raw: &TmdbMovie) -> MovieRecord {
        MovieRecord {
            external_id: raw.id,
            title: text(&raw.title),
            overview: text(&raw.overview),
            poster_path: path(&raw.poster_path),
            backdrop_path: path(&raw.backdrop_path),
            release_date: parse_date(raw.release_date.as_deref()),
            vote_average: raw.vote_average.unwrap_or(0.0),
            vote_count: raw.vote_count.unwrap_or(0),
            genre_ids: raw.genre_ids.clone().unwrap_or_default(),
            adult: raw.adult.unwrap_or(false),
            original_language: text(&raw.original_language),
            original_title: text(&raw.original_title),
            popularity: raw.popularity.unwrap_or(0.0),
            video: raw.video.unwrap_or(false),
            image_urls: self.image_urls(&[
                raw.poster_path.as_deref(),
                raw.backdrop_path.as_deref(),
            ]),
        }
    }

    pub fn series(&self, raw: &TmdbSeries) -> SeriesRecord {
        SeriesRecord {
            external_id: raw.id,
            name: text(&raw.name),
            overview: text(&raw.overview),
            poster_path: path(&raw.poster_path),
            backdrop_path: path(&raw.backdrop_path),
            first_air_date: parse_date(raw.first_air_date.as_deref()),
            vote_average: raw.vote_average.unwrap_or(0.0),
            vote_count: raw.vote_count.unwrap_or(0),
            genre_ids: raw.genre_ids.clone().unwrap_or_default(),
            adult: raw.adult.unwrap_or(false),
            original_language: text(&raw.original_language),
            original_name: text(&raw.original_name),
            popularity: raw.popularity.unwrap_or(0.0),
            origin_country: raw.origin_country.clone().unwrap_or_default(),
            image_urls: self.image_urls(&[
                raw.poster_path.as_deref(),
                raw.backdrop_path.as_deref(),
            ]),
        }
    }

    /// Normalize a listing payload
    pub fn titles(&self, titles: &RemoteTitles) -> Vec<CatalogItem> {
        match titles {
            RemoteTitles::Movies(movies) => movies
                .iter()
                .map(|m| CatalogItem::Movie(self.movie(m)))
                .collect(),
            RemoteTitles::Series(series) => series
                .iter()
                .map(|s| CatalogItem::Series(self.series(s)))
                .collect(),
        }
    }

    /// Normalize a season; `listed_episode_count` comes from the series summary
    pub fn season(
        &self,
        series_id: i64,
        raw: &TmdbSeasonDetails,
        listed_episode_count: Option<i32>,
    ) -> SeasonRecord {
        let episode_count = listed_episode_count
            .unwrap_or_else(|| i32::try_from(raw.episodes.len()).unwrap_or(i32::MAX));

        SeasonRecord {
            id: raw.id,
            series_id,
            season_number: raw.season_number,
            name: text(&raw.name),
            overview: text(&raw.overview),
            air_date: parse_date(raw.air_date.as_deref()),
            episode_count,
            poster_path: path(&raw.poster_path),
            vote_average: raw.vote_average.unwrap_or(0.0),
            image_urls: self.image_urls(&[raw.poster_path.as_deref()]),
        }
    }

    pub fn episode(&self, series_id: i64, season_id: i64, raw: &TmdbEpisode) -> EpisodeRecord {
        EpisodeRecord {
            id: raw.id,
            series_id,
            season_id,
            episode_number: raw.episode_number,
            name: text(&raw.name),
            overview: text(&raw.overview),
            air_date: parse_date(raw.air_date.as_deref()),
            runtime: raw.runtime.unwrap_or(0),
            still_path: path(&raw.still_path),
            vote_average: raw.vote_average.unwrap_or(0.0),
            vote_count: raw.vote_count.unwrap_or(0),
            image_urls: self.image_urls(&[raw.still_path.as_deref()]),
        }
    }
}

/// Parse a `YYYY-MM-DD` date; empty means absent
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!("Dropping unparseable date {:?}: {}", raw, e);
            None
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn path(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}
