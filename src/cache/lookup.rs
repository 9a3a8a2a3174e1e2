use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::CacheStore;
use crate::error::{LocatorError, Result};
use crate::models::Region;

/// Memoizes region lookups by municipality identifier.
///
/// Entries never expire. A value that no longer deserializes is evicted and
/// the lookup falls through to the registry.
#[derive(Clone)]
pub struct LookupCache {
    store: Arc<dyn CacheStore>,
}

/// Store key for a region lookup
pub fn cache_key(municipality_id: &str) -> String {
    format!("regions_{}", municipality_id)
}

impl LookupCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Return cached regions for `municipality_id`, or run `fetch` and cache its result
    pub async fn get_or_fetch<F, Fut>(&self, municipality_id: &str, fetch: F) -> Result<Vec<Region>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Region>>>,
    {
        let key = cache_key(municipality_id);

        if let Some(regions) = self.cached(&key) {
            debug!("Cache hit for {} ({} regions)", key, regions.len());
            return Ok(regions);
        }

        let regions = fetch().await?;
        self.put(&key, &regions);
        Ok(regions)
    }

    fn cached(&self, key: &str) -> Option<Vec<Region>> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match decode_entry(key, &raw) {
            Ok(regions) => Some(regions),
            Err(e) => {
                warn!("{}", e);
                if let Err(e) = self.store.remove(key) {
                    warn!("Failed to evict {}: {}", key, e);
                }
                None
            }
        }
    }

    fn put(&self, key: &str, regions: &[Region]) {
        let result = serde_json::to_string(regions)
            .map_err(LocatorError::from)
            .and_then(|value| self.store.set(key, &value));

        if let Err(e) = result {
            warn!("Failed to cache {}: {}", key, e);
        }
    }
}

fn decode_entry(key: &str, raw: &str) -> Result<Vec<Region>> {
    serde_json::from_str(raw).map_err(|e| LocatorError::CacheCorrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
