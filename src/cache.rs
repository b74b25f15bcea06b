use crate::model::{FetchRequest, MarketSeries, ProviderError};
use crate::provider::MarketDataProvider;
use crate::storage::SqliteStorage;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

struct CachedSeries {
    series: MarketSeries,
    fetched_at: DateTime<Utc>,
}

/// Explicit cache service in front of the data provider, keyed by
/// (symbol, range, interval). Constructed once and handed to the
/// orchestrator; there is no ambient global.
///
/// The entry map lock is held across the provider call, so concurrent
/// lookups of the same key observe either a fresh copy or exactly one
/// download, never two.
pub struct SeriesCache {
    provider: Arc<dyn MarketDataProvider>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedSeries>>,
    storage: Option<Arc<Mutex<SqliteStorage>>>,
}

impl SeriesCache {
    pub fn new(provider: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            entries: Mutex::new(HashMap::new()),
            storage: None,
        }
    }

    pub fn with_storage(
        provider: Arc<dyn MarketDataProvider>,
        ttl: Duration,
        storage: Arc<Mutex<SqliteStorage>>,
    ) -> Self {
        Self {
            storage: Some(storage),
            ..Self::new(provider, ttl)
        }
    }

    /// Returns a series for the request, downloading at most once per key
    /// within the freshness window. `force_refresh` bypasses freshness but
    /// the result is still cached and persisted.
    pub async fn get(
        &self,
        req: &FetchRequest,
        force_refresh: bool,
    ) -> Result<MarketSeries, ProviderError> {
        let key = req.cache_key();
        let mut entries = self.entries.lock().await;
        let now = Utc::now();

        if !force_refresh {
            if let Some(entry) = entries.get(&key) {
                if now - entry.fetched_at < self.ttl {
                    info!("Cache hit for {}", key);
                    return Ok(entry.series.clone());
                }
            } else if let Some(persisted) = self.load_persisted(&key).await {
                if now - persisted.fetched_at < self.ttl {
                    info!("Cache warmed from disk for {}", key);
                    let series = persisted.series.clone();
                    entries.insert(key, persisted);
                    return Ok(series);
                }
            }
        }

        info!("No fresh data for {}, downloading...", key);
        let series = self.provider.fetch(req).await?;
        self.persist(&key, &series, now).await;
        entries.insert(
            key,
            CachedSeries {
                series: series.clone(),
                fetched_at: now,
            },
        );
        Ok(series)
    }

    async fn load_persisted(&self, key: &str) -> Option<CachedSeries> {
        let storage = self.storage.as_ref()?;
        match storage.lock().await.load_series(key) {
            Ok(Some((series, fetched_at))) => Some(CachedSeries { series, fetched_at }),
            Ok(None) => None,
            Err(e) => {
                warn!("Cache load failed: {}", e);
                None
            }
        }
    }

    async fn persist(&self, key: &str, series: &MarketSeries, fetched_at: DateTime<Utc>) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.lock().await.save_series(key, series, fetched_at) {
                warn!("Cache persist failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Bar;
    use chrono::{Days, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn series() -> MarketSeries {
            let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
            let bars = (0..10)
                .map(|i| {
                    let close = 1.08 + i as f64 * 0.001;
                    Bar {
                        date: start + Days::new(i as u64),
                        open: close,
                        high: close + 0.004,
                        low: close - 0.004,
                        close,
                        volume: 0.0,
                    }
                })
                .collect();
            MarketSeries::new("EURUSD=X", "1d", bars).unwrap()
        }
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn fetch(&self, _req: &FetchRequest) -> Result<MarketSeries, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::series())
        }
    }

    fn request() -> FetchRequest {
        FetchRequest {
            symbol: "EURUSD=X".to_string(),
            range: "2y".to_string(),
            interval: "1d".to_string(),
        }
    }

    #[tokio::test]
    async fn second_lookup_within_ttl_skips_provider() {
        let provider = Arc::new(CountingProvider::new());
        let cache = SeriesCache::new(provider.clone(), Duration::hours(1));

        cache.get(&request(), false).await.unwrap();
        cache.get(&request(), false).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn force_refresh_always_downloads() {
        let provider = Arc::new(CountingProvider::new());
        let cache = SeriesCache::new(provider.clone(), Duration::hours(1));

        cache.get(&request(), false).await.unwrap();
        cache.get(&request(), true).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entry_refetches() {
        let provider = Arc::new(CountingProvider::new());
        let cache = SeriesCache::new(provider.clone(), Duration::zero());

        cache.get(&request(), false).await.unwrap();
        cache.get(&request(), false).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn distinct_keys_are_cached_independently() {
        let provider = Arc::new(CountingProvider::new());
        let cache = SeriesCache::new(provider.clone(), Duration::hours(1));

        cache.get(&request(), false).await.unwrap();
        let mut other = request();
        other.range = "1y".to_string();
        cache.get(&other, false).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persisted_series_warms_a_cold_cache() {
        let provider = Arc::new(CountingProvider::new());
        let storage = Arc::new(Mutex::new(SqliteStorage::new(":memory:").unwrap()));
        let cache = SeriesCache::with_storage(provider.clone(), Duration::hours(1), storage.clone());

        cache.get(&request(), false).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        // a second cache over the same storage starts cold but warm on disk
        let cold = SeriesCache::with_storage(provider.clone(), Duration::hours(1), storage);
        cold.get(&request(), false).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
