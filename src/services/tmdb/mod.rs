//! Remote catalog integration (TMDB)
//!
//! # Overview
//!
//! The synchronizer only depends on [`CatalogSource`]: one async operation per
//! semantic endpoint, each issuing a single request.
//!
//! | Operation              | Endpoint                               |
//! |------------------------|----------------------------------------|
//! | `fetch_trending`       | `/trending/{movie,tv}/day`             |
//! | `fetch_popular`        | `/{movie,tv}/popular`                  |
//! | `fetch_by_genre`       | `/discover/{movie,tv}?with_genres={id}`|
//! | `fetch_series_details` | `/tv/{id}`                             |
//! | `fetch_season_details` | `/tv/{id}/season/{n}`                  |
//!
//! Non-success statuses surface as `CatalogError::Status`, payloads missing a
//! required field as `CatalogError::Schema`. Retry policy belongs to callers.

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::errors::CatalogError;
use crate::models::MediaKind;

pub use client::TmdbClient;
pub use types::{
    RemoteTitles, TmdbEpisode, TmdbMovie, TmdbSeasonDetails, TmdbSeasonSummary, TmdbSeries,
    TmdbSeriesDetails,
};

/// Source of remote catalog data
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_trending(&self, kind: MediaKind) -> Result<RemoteTitles, CatalogError>;

    async fn fetch_popular(&self, kind: MediaKind) -> Result<RemoteTitles, CatalogError>;

    async fn fetch_by_genre(
        &self,
        kind: MediaKind,
        genre_id: i64,
    ) -> Result<RemoteTitles, CatalogError>;

    async fn fetch_series_details(&self, series_id: i64)
        -> Result<TmdbSeriesDetails, CatalogError>;

    async fn fetch_season_details(
        &self,
        series_id: i64,
        season_number: i32,
    ) -> Result<TmdbSeasonDetails, CatalogError>;
}
