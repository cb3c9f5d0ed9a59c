//! Staleness cache
//!
//! Last-sync timestamps stored in the `sync_cache` relation. An entry is
//! fresh while `now - timestamp < TTL`.

use std::sync::Arc;

use crate::db::CatalogStore;
use crate::errors::StoreError;
use crate::models::SyncCacheEntry;

/// Key of the catalog sync entry
pub const LAST_SYNC_KEY: &str = "last_sync";

/// Time-to-live of a sync entry (24h, in milliseconds)
pub const SYNC_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Whether an entry written at `timestamp` is still valid at `now`
pub fn is_fresh(timestamp: i64, now: i64) -> bool {
    now.saturating_sub(timestamp) < SYNC_TTL_MS
}

/// Reads and writes timestamped entries through the store
pub struct StalenessCache<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: CatalogStore + ?Sized> StalenessCache<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The entry for `key` if it exists and has not expired
    pub async fn get_fresh(&self, key: &str) -> Result<Option<SyncCacheEntry>, StoreError> {
        let now = self.clock.now_millis();
        let entry = self.store.get_cache_entry(key).await?;

        Ok(entry.filter(|e| {
            let fresh = is_fresh(e.timestamp, now);
            if !fresh {
                tracing::debug!(
                    "Cache entry {} expired ({} ms old)",
                    key,
                    now.saturating_sub(e.timestamp)
                );
            }
            fresh
        }))
    }

    /// Write `payload` under `key` stamped with the current time
    pub async fn put(
        &self,
        key: &str,
        payload: serde_json::Value,
    ) -> Result<SyncCacheEntry, StoreError> {
        let entry = SyncCacheEntry {
            key: key.to_string(),
            timestamp: self.clock.now_millis(),
            payload,
        };
        self.store.put_cache_entry(&entry).await?;
        Ok(entry)
    }
}

#[cfg(test)]
pub mod test_support {
    use super::Clock;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Manually advanced clock
    #[derive(Debug, Default)]
    pub struct ManualClock(AtomicI64);

    impl ManualClock {
        pub fn at(millis: i64) -> Self {
            Self(AtomicI64::new(millis))
        }

        pub fn advance(&self, millis: i64) {
            self.0.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }
}
