//! Caching layer for wallpaper-service
//!
//! The pipeline only sees the `CacheStore` capability. `RedisCache` backs it
//! with a shared connection manager; `NoCache` is the sentinel used both when
//! no backend is configured and when the configured backend fails its
//! per-request liveness probe, so both cases run the same code path.

pub mod keys;

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

/// Shared Redis connection manager guarded by a Tokio mutex
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Deadline for any single cache operation, liveness probe included
const OP_TIMEOUT: Duration = Duration::from_secs(1);

/// Run a cache operation under the deadline. A store that stalls mid-request
/// degrades to `Timeout` instead of holding the requesting task.
async fn with_deadline<T, F>(op: F) -> CacheResult<T>
where
    F: Future<Output = CacheResult<T>>,
{
    tokio::time::timeout(OP_TIMEOUT, op)
        .await
        .map_err(|_| CacheError::Timeout)?
}

/// Key/value store capability with per-key TTL
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value; `Ok(None)` is a miss
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value with the given TTL
    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> CacheResult<()>;
}

/// Redis-backed cache store
#[derive(Clone)]
pub struct RedisCache {
    conn: SharedConnectionManager,
}

impl RedisCache {
    pub fn new(conn: SharedConnectionManager) -> Self {
        Self { conn }
    }

    /// Round-trip a PING to check the backend is reachable right now
    async fn ping(&self) -> CacheResult<()> {
        with_deadline(async {
            let mut conn = self.conn.lock().await;
            let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;
            if pong == "PONG" {
                Ok(())
            } else {
                Err(CacheError::Redis(redis::RedisError::from((
                    redis::ErrorKind::ResponseError,
                    "unexpected PING response",
                ))))
            }
        })
        .await
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        with_deadline(async {
            let mut conn = self.conn.lock().await;
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> CacheResult<()> {
        with_deadline(async {
            let mut conn = self.conn.lock().await;
            conn.set_ex(key, value, ttl_secs)
                .await
                .map_err(CacheError::Redis)
        })
        .await
    }
}

/// Sentinel store for cacheless operation: every read misses, every write
/// succeeds without effect.
pub struct NoCache;

#[async_trait]
impl CacheStore for NoCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl_secs: u64) -> CacheResult<()> {
        Ok(())
    }
}

/// Configured Redis backend with a lazily established connection manager.
///
/// The manager is only built on the first request that can actually reach
/// the store, so a backend that is down at startup degrades requests instead
/// of failing the boot.
#[derive(Clone)]
struct Backend {
    client: redis::Client,
    manager: Arc<Mutex<Option<SharedConnectionManager>>>,
}

impl Backend {
    fn new(client: redis::Client) -> Self {
        Self {
            client,
            manager: Arc::new(Mutex::new(None)),
        }
    }

    /// Establish (or reuse) the connection manager, then probe it
    async fn acquire(&self) -> CacheResult<RedisCache> {
        let shared = {
            let mut slot = self.manager.lock().await;
            match &*slot {
                Some(shared) => shared.clone(),
                None => {
                    let manager = with_deadline(async {
                        ConnectionManager::new(self.client.clone())
                            .await
                            .map_err(CacheError::Redis)
                    })
                    .await?;
                    let shared: SharedConnectionManager = Arc::new(Mutex::new(manager));
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };

        let cache = RedisCache::new(shared);
        cache.ping().await?;
        Ok(cache)
    }
}

/// Handle to the optional cache backend, held in app state.
///
/// `session` is called once per inbound request and decides whether that
/// request runs cache-backed: a missing backend or a failed liveness probe
/// both yield `NoCache`.
#[derive(Clone, Default)]
pub struct CacheHandle {
    backend: Option<Backend>,
}

impl CacheHandle {
    /// Build a handle for the given connection URL. Only URL parsing can
    /// fail here; no connection is attempted until the first request.
    pub fn from_url(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            backend: Some(Backend::new(client)),
        })
    }

    /// Acquire the store for one request
    pub async fn session(&self) -> Arc<dyn CacheStore> {
        match &self.backend {
            None => Arc::new(NoCache),
            Some(backend) => match backend.acquire().await {
                Ok(store) => Arc::new(store),
                Err(err) => {
                    warn!("cache backend unreachable, serving uncached: {err}");
                    Arc::new(NoCache)
                }
            },
        }
    }
}
