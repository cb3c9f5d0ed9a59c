use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Remote catalog media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Path segment used by the remote API ("movie" / "tv")
    pub fn path_segment(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// Normalized movie, keyed by the remote id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub external_id: i64,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub genre_ids: Vec<i64>,
    pub adult: bool,
    pub original_language: String,
    pub original_title: String,
    pub popularity: f64,
    pub video: bool,
    pub image_urls: Vec<String>,
}

/// Normalized TV series, keyed by the remote id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecord {
    pub external_id: i64,
    pub name: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub genre_ids: Vec<i64>,
    pub adult: bool,
    pub original_language: String,
    pub original_name: String,
    pub popularity: f64,
    pub origin_country: Vec<String>,
    pub image_urls: Vec<String>,
}

/// A remote title after normalization
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    Movie(MovieRecord),
    Series(SeriesRecord),
}

/// Season of a stored series, keyed by (series_id, season_number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    pub name: String,
    pub overview: String,
    pub air_date: Option<NaiveDate>,
    pub episode_count: i32,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub image_urls: Vec<String>,
}

/// Episode of a stored season, keyed by (series_id, season_id, episode_number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
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
    pub image_urls: Vec<String>,
}
