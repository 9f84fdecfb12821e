//! Redis-backed JSON cache for expensive AI results.
//!
//! Cache failures are never fatal: reads degrade to a miss, writes are dropped.
//! One multiplexed connection is shared by all requests. After a failed
//! connect, Redis is skipped until `RECONNECT_COOLDOWN` has passed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use redis::aio::MultiplexedConnection;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "casting-api";
const RECONNECT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Link {
    conn: Option<MultiplexedConnection>,
    failed_at: Option<Instant>,
}

#[derive(Clone)]
pub struct Cache {
    client: redis::Client,
    link: Arc<Mutex<Link>>,
    ttl_secs: u64,
}

impl Cache {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self {
            client,
            link: Arc::new(Mutex::new(Link::default())),
            ttl_secs,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("Cache hit: {key}");
                    Some(value)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {key}: {e}");
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping cache write for {key}: {e}");
                return;
            }
        };
        if let Err(e) = self.try_put(key, payload).await {
            warn!("Cache write failed for {key}: {e}");
        }
    }

    /// Shared connection, or `None` while Redis is unreachable.
    async fn connection(&self) -> Option<MultiplexedConnection> {
        let mut link = self.link.lock().await;
        if let Some(conn) = &link.conn {
            return Some(conn.clone());
        }
        if link
            .failed_at
            .is_some_and(|at| at.elapsed() < RECONNECT_COOLDOWN)
        {
            return None;
        }
        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                debug!("Connected to Redis");
                link.failed_at = None;
                link.conn = Some(conn.clone());
                Some(conn)
            }
            Err(e) => {
                warn!("Redis unavailable, caching paused: {e}");
                link.failed_at = Some(Instant::now());
                None
            }
        }
    }

    /// Drops a broken connection so the next call reconnects.
    async fn reset_if_dropped(&self, err: &redis::RedisError) {
        if err.is_io_error() || err.is_connection_dropped() {
            let mut link = self.link.lock().await;
            link.conn = None;
        }
    }

    async fn try_get(&self, key: &str) -> redis::RedisResult<Option<String>> {
        let Some(mut conn) = self.connection().await else {
            return Ok(None);
        };
        let result = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await;
        if let Err(e) = &result {
            self.reset_if_dropped(e).await;
        }
        result
    }

    async fn try_put(&self, key: &str, payload: String) -> redis::RedisResult<()> {
        let Some(mut conn) = self.connection().await else {
            return Ok(());
        };
        let result = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await;
        if let Err(e) = &result {
            self.reset_if_dropped(e).await;
        }
        result
    }
}

/// Builds a namespaced cache key from its parts.
pub fn cache_key(namespace: &str, parts: &[&str]) -> String {
    let mut key = format!("{KEY_PREFIX}:{namespace}");
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_namespaced() {
        assert_eq!(
            cache_key("recommendations", &["p1", "r1", "10"]),
            "casting-api:recommendations:p1:r1:10"
        );
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_miss() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let cache = Cache::new(client, 60);
        let value: Option<Vec<u32>> = cache.get_json("missing").await;
        assert!(value.is_none());
        cache.put_json("missing", &vec![1, 2, 3]).await;
    }

    #[tokio::test]
    async fn test_failed_connect_is_not_retried_per_call() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let cache = Cache::new(client, 60);
        assert!(cache.connection().await.is_none());
        let failed_at = cache.link.lock().await.failed_at.unwrap();

        let value: Option<String> = cache.get_json("k").await;
        assert!(value.is_none());
        cache.put_json("k", &"v").await;

        let link = cache.link.lock().await;
        assert_eq!(link.failed_at, Some(failed_at));
        assert!(link.conn.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_one_link() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let cache = Cache::new(client, 60);
        let clone = cache.clone();
        assert!(cache.connection().await.is_none());
        assert!(clone.link.lock().await.failed_at.is_some());
    }
}
