use serde::{Deserialize, Serialize};

/// Last-sync bookkeeping row (one per key, last write wins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCacheEntry {
    pub key: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub payload: serde_json::Value,
}

/// Synchronizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Idle,
    Movies,
    Series,
    Genres,
    Details,
}

impl Default for SyncPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "idle"),
            SyncPhase::Movies => write!(f, "movies"),
            SyncPhase::Series => write!(f, "series"),
            SyncPhase::Genres => write!(f, "genres"),
            SyncPhase::Details => write!(f, "details"),
        }
    }
}

/// Counts produced by one full sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub movies: usize,
    pub series: usize,
    pub genres_synced: usize,
    pub series_detailed: usize,
    pub seasons: usize,
    pub episodes: usize,
    /// Enrichment units that failed and were skipped ("genre:28", "series:1399")
    #[serde(default)]
    pub failures: Vec<String>,
}

/// Result of a sync trigger
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Cache still fresh, nothing fetched
    #[serde(rename_all = "camelCase")]
    Skipped { last_sync: i64 },
    /// Full sync ran and the cache was refreshed
    #[serde(rename_all = "camelCase")]
    Completed { finished_at: i64, report: SyncReport },
}
