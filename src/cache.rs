//! In-memory dataset cache.
//!
//! One entry per dataset, refreshed wholesale once its age exceeds the TTL.
//! Tables are shared behind `Arc`, so readers holding a table across a
//! refresh keep a consistent snapshot. Concurrent refreshes of the same
//! dataset may fetch twice; the last decode wins and both results are
//! equivalent.

use crate::dataset::DatasetId;
use crate::decode;
use crate::error::RadiantError;
use crate::table::Table;

use async_trait::async_trait;
use bytes::Bytes;
use hashbrown::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Source of raw dataset bytes. Implemented by the S3 client and by test
/// stubs.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, dataset: DatasetId) -> Result<Bytes, RadiantError>;
}

type Clock = Box<dyn Fn() -> Instant + Send + Sync>;

/// TTL cache of decoded dataset tables.
pub struct DatasetCache {
    fetcher: Box<dyn BlobFetcher>,
    ttl: Duration,
    clock: Clock,
    entries: RwLock<HashMap<DatasetId, (Arc<Table>, Instant)>>,
}

impl DatasetCache {
    /// Create a cache over `fetcher` with entries valid for `ttl`.
    pub fn new(fetcher: Box<dyn BlobFetcher>, ttl: Duration) -> Self {
        Self::with_clock(fetcher, ttl, Box::new(Instant::now))
    }

    /// Create a cache with an injected clock. Tests advance time through it.
    pub fn with_clock(fetcher: Box<dyn BlobFetcher>, ttl: Duration, clock: Clock) -> Self {
        DatasetCache {
            fetcher,
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the dataset's table, fetching and decoding when the cached
    /// entry is absent or older than the TTL.
    pub async fn get(&self, dataset: DatasetId) -> Result<Arc<Table>, RadiantError> {
        let now = (self.clock)();
        {
            let entries = self.entries.read().await;
            if let Some((table, fetched_at)) = entries.get(&dataset) {
                if now.duration_since(*fetched_at) < self.ttl {
                    return Ok(Arc::clone(table));
                }
            }
        }

        tracing::debug!(dataset = %dataset, "refreshing dataset");
        let bytes = self.fetcher.fetch(dataset).await?;
        let table = Arc::new(decode::decode(&bytes, dataset.schema())?);
        let mut entries = self.entries.write().await;
        entries.insert(dataset, (Arc::clone(&table), now));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    struct StubFetcher {
        fetches: AtomicUsize,
        payload: &'static str,
    }

    impl StubFetcher {
        fn new(payload: &'static str) -> Self {
            StubFetcher {
                fetches: AtomicUsize::new(0),
                payload,
            }
        }
    }

    #[async_trait]
    impl BlobFetcher for Arc<StubFetcher> {
        async fn fetch(&self, _dataset: DatasetId) -> Result<Bytes, RadiantError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(self.payload.as_bytes()))
        }
    }

    const CSV: &str = "Municipio,Fecha\nMerida,2020-01-15\n";

    fn cache_with_clock(
        fetcher: Arc<StubFetcher>,
        ttl: Duration,
    ) -> (DatasetCache, Arc<AtomicU64>) {
        let offset = Arc::new(AtomicU64::new(0));
        let tick = Arc::clone(&offset);
        let base = Instant::now();
        let clock =
            Box::new(move || base + Duration::from_secs(tick.load(Ordering::SeqCst)));
        (DatasetCache::with_clock(Box::new(fetcher), ttl, clock), offset)
    }

    #[tokio::test]
    async fn fresh_entries_are_served_from_memory() {
        let fetcher = Arc::new(StubFetcher::new(CSV));
        let (cache, _) = cache_with_clock(Arc::clone(&fetcher), Duration::from_secs(300));

        let first = cache.get(DatasetId::Radiance).await.unwrap();
        let second = cache.get(DatasetId::Radiance).await.unwrap();
        assert_eq!(1, fetcher.fetches.load(Ordering::SeqCst));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn stale_entries_are_refreshed() {
        let fetcher = Arc::new(StubFetcher::new(CSV));
        let (cache, offset) = cache_with_clock(Arc::clone(&fetcher), Duration::from_secs(300));

        cache.get(DatasetId::Radiance).await.unwrap();
        // Just inside the window: still cached.
        offset.store(299, Ordering::SeqCst);
        cache.get(DatasetId::Radiance).await.unwrap();
        assert_eq!(1, fetcher.fetches.load(Ordering::SeqCst));
        // At the TTL boundary the entry is stale.
        offset.store(300, Ordering::SeqCst);
        cache.get(DatasetId::Radiance).await.unwrap();
        assert_eq!(2, fetcher.fetches.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn datasets_are_cached_independently() {
        let fetcher = Arc::new(StubFetcher::new(CSV));
        let (cache, _) = cache_with_clock(Arc::clone(&fetcher), Duration::from_secs(300));

        cache.get(DatasetId::Radiance).await.unwrap();
        cache.get(DatasetId::Gdp).await.unwrap();
        assert_eq!(2, fetcher.fetches.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn decode_failures_propagate_and_cache_nothing() {
        let fetcher = Arc::new(StubFetcher::new("a,b\n1\n"));
        let (cache, _) = cache_with_clock(Arc::clone(&fetcher), Duration::from_secs(300));

        assert!(cache.get(DatasetId::Radiance).await.is_err());
        assert!(cache.get(DatasetId::Radiance).await.is_err());
        // No entry was stored, so each attempt fetched again.
        assert_eq!(2, fetcher.fetches.load(Ordering::SeqCst));
    }
}
