//! TMDB API Client
//!
//! HTTP client for the TMDB v3 endpoints the catalog sync needs.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::types::*;
use super::CatalogSource;
use crate::config::Config;
use crate::errors::CatalogError;
use crate::models::MediaKind;

/// TMDB API Client
///
/// One request per call, no retries. Every request carries the bearer token
/// and the deployment language.
pub struct TmdbClient {
    http: Client,
    base_url: Url,
    api_token: String,
    language: String,
}

impl TmdbClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://api.themoviedb.org/3")
    /// * `api_token` - v4 read access token, sent as `Authorization: Bearer`
    /// * `language` - value of the `language` query parameter
    pub fn new(
        base_url: &str,
        api_token: &str,
        language: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, CatalogError> {
        // Url::join drops the last segment unless the base ends with '/'
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| CatalogError::Setup(format!("base url {}: {}", base_url, e)))?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|e| CatalogError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_token: api_token.to_string(),
            language: language.to_string(),
        })
    }

    /// Create from application config
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        Self::new(
            &config.tmdb_base_url,
            &config.tmdb_api_token,
            &config.tmdb_language,
            Duration::from_millis(config.fetch_timeout_ms),
            &config.user_agent,
        )
    }

    /// Build the full URL for an endpoint path plus extra query pairs
    fn endpoint_url(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Url, CatalogError> {
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| CatalogError::Setup(format!("endpoint {}: {}", endpoint, e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("language", &self.language);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Make a GET request and decode the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url = self.endpoint_url(endpoint, query)?;

        debug!("TMDB request: {}", endpoint);

        let network = |e: reqwest::Error| CatalogError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        };

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        let text = response.text().await.map_err(network)?;

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse TMDB response for '{}': {}", endpoint, e);
            debug!("Response text: {}", text.chars().take(500).collect::<String>());
            CatalogError::Schema {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Fetch a listing endpoint, typed by kind
    async fn get_titles(
        &self,
        kind: MediaKind,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<RemoteTitles, CatalogError> {
        let titles = match kind {
            MediaKind::Movie => {
                let page: PagedResponse<TmdbMovie> = self.get(endpoint, query).await?;
                RemoteTitles::Movies(page.results)
            }
            MediaKind::Series => {
                let page: PagedResponse<TmdbSeries> = self.get(endpoint, query).await?;
                RemoteTitles::Series(page.results)
            }
        };
        Ok(titles)
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn fetch_trending(&self, kind: MediaKind) -> Result<RemoteTitles, CatalogError> {
        let endpoint = format!("trending/{}/day", kind.path_segment());
        self.get_titles(kind, &endpoint, &[]).await
    }

    async fn fetch_popular(&self, kind: MediaKind) -> Result<RemoteTitles, CatalogError> {
        let endpoint = format!("{}/popular", kind.path_segment());
        self.get_titles(kind, &endpoint, &[]).await
    }

    async fn fetch_by_genre(
        &self,
        kind: MediaKind,
        genre_id: i64,
    ) -> Result<RemoteTitles, CatalogError> {
        let endpoint = format!("discover/{}", kind.path_segment());
        self.get_titles(kind, &endpoint, &[("with_genres", genre_id.to_string())])
            .await
    }

    async fn fetch_series_details(
        &self,
        series_id: i64,
    ) -> Result<TmdbSeriesDetails, CatalogError> {
        self.get(&format!("tv/{}", series_id), &[]).await
    }

    async fn fetch_season_details(
        &self,
        series_id: i64,
        season_number: i32,
    ) -> Result<TmdbSeasonDetails, CatalogError> {
        self.get(&format!("tv/{}/season/{}", series_id, season_number), &[])
            .await
    }
}
