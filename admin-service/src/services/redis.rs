use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

/// Key/value store holding serialized cache entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error>;
    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn delete_cache(&self, key: &str) -> Result<(), anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisService {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl CacheStore for RedisService {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }

    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set cache: {}", e))
    }

    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get cache: {}", e))
    }

    async fn delete_cache(&self, key: &str) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete cache entry: {}", e))?;
        Ok(())
    }
}

/// In-process cache store for tests. Counts writes so callers can assert
/// how often the cache was populated.
#[derive(Default)]
pub struct MockCacheStore {
    pub cache: Mutex<HashMap<String, String>>,
    set_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MockCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_cache` calls so far.
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Simulate an unreachable cache server.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), anyhow::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("Mock cache unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MockCacheStore {
    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.ensure_available()
    }

    async fn set_cache(
        &self,
        key: &str,
        value: &str,
        _expiry_seconds: u64,
    ) -> Result<(), anyhow::Error> {
        self.ensure_available()?;
        self.cache
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .insert(key.to_string(), value.to_string());
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_cache(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        self.ensure_available()?;
        let val = self
            .cache
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .get(key)
            .cloned();
        Ok(val)
    }

    async fn delete_cache(&self, key: &str) -> Result<(), anyhow::Error> {
        self.ensure_available()?;
        self.cache
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?
            .remove(key);
        Ok(())
    }
}
