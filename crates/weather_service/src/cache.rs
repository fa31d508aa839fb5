//! TTL caches for fetched weather.
//!
//! Uses `DashMap` so concurrent decision requests read without contending
//! on a single lock.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{Error, ForecastReport};
use tracing::{debug, info};

use crate::{CurrentConditions, ForecastSource};

/// A cached value with staleness tracking.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub updated_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            updated_at: Instant::now(),
        }
    }

    /// A zero TTL makes every entry stale.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.updated_at.elapsed() >= ttl
    }
}

/// Current conditions keyed by source configuration.
pub type ConditionsCache = Arc<DashMap<String, CacheEntry<CurrentConditions>>>;

/// Forecasts keyed by rounded coordinates.
pub type ForecastCache = Arc<DashMap<String, CacheEntry<ForecastReport>>>;

pub fn new_conditions_cache() -> ConditionsCache {
    Arc::new(DashMap::new())
}

pub fn new_forecast_cache() -> ForecastCache {
    Arc::new(DashMap::new())
}

/// Cache key for a location; ~10 m resolution.
pub fn location_key(latitude: f64, longitude: f64) -> String {
    format!("{:.4},{:.4}", latitude, longitude)
}

/// Fresh value for `key`, if any. Stale entries are evicted.
pub fn get_fresh<T: Clone>(
    cache: &DashMap<String, CacheEntry<T>>,
    key: &str,
    ttl: Duration,
) -> Option<T> {
    let fresh = cache.get(key).and_then(|entry| {
        if entry.is_stale(ttl) {
            None
        } else {
            Some(entry.value.clone())
        }
    });
    if fresh.is_none() {
        evict_if_stale(cache, key, ttl);
    }
    fresh
}

/// Remove `key` only if its entry is still stale, so a value refreshed by
/// another task in the meantime survives.
pub fn evict_if_stale<T>(cache: &DashMap<String, CacheEntry<T>>, key: &str, ttl: Duration) -> bool {
    cache.remove_if(key, |_, entry| entry.is_stale(ttl)).is_some()
}

/// Forecast source that answers from a per-location cache while fresh.
///
/// Shared between the forecast path and the NWS current-conditions fallback
/// so one run fetches a location's forecast at most once.
pub struct CachedForecastSource {
    inner: Arc<dyn ForecastSource>,
    cache: ForecastCache,
    ttl: Duration,
}

impl CachedForecastSource {
    pub fn new(inner: Arc<dyn ForecastSource>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: new_forecast_cache(),
            ttl,
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl ForecastSource for CachedForecastSource {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<ForecastReport, Error> {
        let key = location_key(latitude, longitude);
        if let Some(hit) = get_fresh(&self.cache, &key, self.ttl) {
            debug!("Forecast for {} served from cache", key);
            return Ok(hit);
        }

        let report = self.inner.fetch_forecast(latitude, longitude).await?;
        info!(
            "Fetched {} forecast periods for {}",
            report.periods.len(),
            key
        );
        self.cache.insert(key, CacheEntry::new(report.clone()));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_is_always_stale() {
        let entry = CacheEntry::new(1);
        assert!(entry.is_stale(Duration::ZERO));
        assert!(!entry.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_get_fresh_evicts_stale() {
        let cache: DashMap<String, CacheEntry<u32>> = DashMap::new();
        cache.insert("k".into(), CacheEntry::new(7));
        assert_eq!(get_fresh(&cache, "k", Duration::from_secs(60)), Some(7));
        assert_eq!(get_fresh(&cache, "k", Duration::ZERO), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_spares_fresh_entry() {
        let cache: DashMap<String, CacheEntry<u32>> = DashMap::new();
        cache.insert("k".into(), CacheEntry::new(7));

        assert!(!evict_if_stale(&cache, "k", Duration::from_secs(60)));
        assert_eq!(cache.get("k").map(|e| e.value), Some(7));

        assert!(evict_if_stale(&cache, "k", Duration::ZERO));
        assert!(!evict_if_stale(&cache, "missing", Duration::ZERO));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_location_key_rounds() {
        assert_eq!(location_key(40.712_800_1, -74.006), "40.7128,-74.0060");
    }
}
