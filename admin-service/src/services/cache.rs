//! Cache-aside wrapper over a [`CacheStore`].
//!
//! Values are stored as JSON with a fixed lifetime read once at construction.
//! A miss is `Ok(None)`; a failing cache store surfaces as [`ServiceError::Cache`].

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::services::error::{ensure_active, ServiceError};
use crate::services::metrics;
use crate::services::redis::CacheStore;

#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    lifetime_seconds: u64,
}

fn require_key(key: &str) -> Result<(), ServiceError> {
    if key.trim().is_empty() {
        return Err(ServiceError::CacheKeyOrValueMissing(
            "Cache key must not be blank".to_string(),
        ));
    }
    Ok(())
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>, lifetime_seconds: u64) -> Self {
        Self {
            store,
            lifetime_seconds,
        }
    }

    pub fn lifetime_seconds(&self) -> u64 {
        self.lifetime_seconds
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ServiceError> {
        require_key(key)?;
        ensure_active(cancel)?;

        let raw = self.store.get_cache(key).await.map_err(ServiceError::Cache)?;
        match raw {
            Some(raw) => {
                metrics::record_cache_lookup("hit");
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => {
                metrics::record_cache_lookup("miss");
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        require_key(key)?;

        let json = serde_json::to_value(value)?;
        let blank = match &json {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if blank {
            return Err(ServiceError::CacheKeyOrValueMissing(format!(
                "Cache value for '{}' must not be empty",
                key
            )));
        }

        ensure_active(cancel)?;
        self.store
            .set_cache(key, &json.to_string(), self.lifetime_seconds)
            .await
            .map_err(ServiceError::Cache)
    }

    /// Remove `key`. Removing a key that is not cached is not an error.
    pub async fn delete(&self, key: &str, cancel: &CancellationToken) -> Result<(), ServiceError> {
        require_key(key)?;
        ensure_active(cancel)?;
        self.store
            .delete_cache(key)
            .await
            .map_err(ServiceError::Cache)
    }

    /// Return the cached value for `key`, or run `compute` and cache what it yields.
    ///
    /// `compute` runs at most once and only on a miss. An absent result is
    /// returned as-is and never cached.
    #[instrument(skip(self, compute, cancel))]
    pub async fn wrap_cache_operations<T, F, Fut>(
        &self,
        key: &str,
        compute: F,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, ServiceError>>,
    {
        if let Some(cached) = self.get(key, cancel).await? {
            debug!("Cache hit");
            return Ok(Some(cached));
        }

        let Some(value) = compute().await? else {
            debug!("Nothing to cache");
            return Ok(None);
        };

        // A cancelled call must not leave a cache entry behind.
        ensure_active(cancel)?;
        self.set(key, &value, cancel).await?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::redis::MockCacheStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> (Arc<MockCacheStore>, CacheService) {
        let store = Arc::new(MockCacheStore::new());
        let cache = CacheService::new(store.clone(), 60);
        (store, cache)
    }

    #[tokio::test]
    async fn miss_computes_once_and_writes_once() {
        let (store, cache) = service();
        let cancel = CancellationToken::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let value = cache
            .wrap_cache_operations(
                "user:1",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some("alice".to_string()))
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(value.as_deref(), Some("alice"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(store.set_calls(), 1);
    }

    #[tokio::test]
    async fn hit_skips_compute() {
        let (store, cache) = service();
        let cancel = CancellationToken::new();
        cache.set("user:1", &"alice", &cancel).await.unwrap();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let value: Option<String> = cache
            .wrap_cache_operations(
                "user:1",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some("bob".to_string()))
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(value.as_deref(), Some("alice"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(store.set_calls(), 1);
    }

    #[tokio::test]
    async fn absent_result_is_not_cached() {
        let (store, cache) = service();
        let cancel = CancellationToken::new();

        let value: Option<String> = cache
            .wrap_cache_operations("user:2", || async { Ok(None) }, &cancel)
            .await
            .unwrap();

        assert!(value.is_none());
        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let (_, cache) = service();
        let cancel = CancellationToken::new();
        let result: Result<Option<String>, _> = cache.get("  ", &cancel).await;
        assert!(matches!(
            result,
            Err(ServiceError::CacheKeyOrValueMissing(_))
        ));
        assert!(matches!(
            cache.delete("", &cancel).await,
            Err(ServiceError::CacheKeyOrValueMissing(_))
        ));
    }

    #[tokio::test]
    async fn empty_value_is_rejected() {
        let (store, cache) = service();
        let cancel = CancellationToken::new();
        let result = cache.set("k", &Option::<String>::None, &cancel).await;
        assert!(matches!(
            result,
            Err(ServiceError::CacheKeyOrValueMissing(_))
        ));
        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_not_a_miss() {
        let (store, cache) = service();
        let cancel = CancellationToken::new();
        store.set_unavailable(true);
        let result: Result<Option<String>, _> = cache.get("user:1", &cancel).await;
        assert!(matches!(result, Err(ServiceError::Cache(_))));
    }

    #[tokio::test]
    async fn cancellation_during_compute_writes_nothing() {
        let (store, cache) = service();
        let cancel = CancellationToken::new();
        let trigger = &cancel;

        let result = cache
            .wrap_cache_operations(
                "user:1",
                move || async move {
                    trigger.cancel();
                    Ok(Some("alice".to_string()))
                },
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Cancelled)));
        assert_eq!(store.set_calls(), 0);
    }

    #[tokio::test]
    async fn deleting_missing_key_is_ok() {
        let (_, cache) = service();
        let cancel = CancellationToken::new();
        assert!(cache.delete("user:404", &cancel).await.is_ok());
    }
}
