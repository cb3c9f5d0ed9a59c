//! TMDB API Types
//!
//! Response payloads for the trending, popular, discover and detail endpoints.
//! Only the ids are required; every other field tolerates being missing or null.

use serde::Deserialize;

/// One page of a listing endpoint (only the first page is fetched)
#[derive(Debug, Clone, Deserialize)]
pub struct PagedResponse<T> {
    pub results: Vec<T>,
}

/// Movie as returned by listing endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub genre_ids: Option<Vec<i64>>,
    pub adult: Option<bool>,
    pub original_language: Option<String>,
    pub popularity: Option<f64>,
    pub video: Option<bool>,
}

/// TV series as returned by listing endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbSeries {
    pub id: i64,
    pub name: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub genre_ids: Option<Vec<i64>>,
    pub adult: Option<bool>,
    pub original_language: Option<String>,
    pub popularity: Option<f64>,
    pub origin_country: Option<Vec<String>>,
}

/// Listing payload, typed by media kind
#[derive(Debug, Clone)]
pub enum RemoteTitles {
    Movies(Vec<TmdbMovie>),
    Series(Vec<TmdbSeries>),
}

impl RemoteTitles {
    pub fn len(&self) -> usize {
        match self {
            RemoteTitles::Movies(v) => v.len(),
            RemoteTitles::Series(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Season summary inside `/tv/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbSeasonSummary {
    pub season_number: i32,
    pub episode_count: Option<i32>,
}

/// `/tv/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbSeriesDetails {
    pub id: i64,
    pub name: Option<String>,
    #[serde(default)]
    pub seasons: Vec<TmdbSeasonSummary>,
}

/// Episode inside `/tv/{id}/season/{n}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbEpisode {
    pub id: i64,
    pub episode_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
}

/// `/tv/{id}/season/{n}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbSeasonDetails {
    pub id: i64,
    pub season_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}
