//! Opt-in read-through caching for repository queries.
//!
//! Read paths that want caching wrap their query in
//! [`QueryCache::read_through`], passing a [`CacheKey`] built from the query
//! filter and target table plus a TTL. This is an explicit decorator a call
//! site opts into per query; nothing patches the shared query path and
//! writes never purge affected keys, so staleness up to the TTL window is an
//! accepted trade-off.
//!
//! The backing store is redis. Every cache-store failure (connection refused,
//! timeout, corrupt payload) is logged at warn and treated as a cache miss -
//! the wrapped query still runs and the request never fails because of the
//! cache.

use std::collections::BTreeMap;
use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::db::RepositoryError;

/// Default TTL for cached reads.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// A deterministic cache key: canonical JSON of (collection, filter).
///
/// Object keys are sorted recursively so two queries with the same filter
/// written in different field order share one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key for a query against `collection` with the given filter.
    #[must_use]
    pub fn new(collection: &str, filter: &serde_json::Value) -> Self {
        let canonical = serde_json::json!({
            "collection": collection,
            "filter": canonicalize(filter),
        });
        Self(canonical.to_string())
    }

    /// The key as stored in redis.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Recursively rebuild JSON objects with sorted keys.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<&String, serde_json::Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            serde_json::to_value(sorted).unwrap_or_else(|_| value.clone())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

/// Read-through cache over the redis key-value store.
///
/// Cheaply cloneable; the underlying `ConnectionManager` multiplexes one
/// connection and reconnects on failure.
#[derive(Clone)]
pub struct QueryCache {
    conn: ConnectionManager,
}

impl QueryCache {
    /// Connect to the cache store.
    ///
    /// # Errors
    ///
    /// Returns `redis::RedisError` if the URL is invalid or the initial
    /// connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(250));

        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn })
    }

    /// Serve `key` from the cache, or run `fetch` and store its result.
    ///
    /// On a hit the stored JSON is deserialized and returned without running
    /// `fetch` at all. On a miss (including any cache-store error) `fetch`
    /// runs and its serialized result is stored with `ttl`.
    ///
    /// # Errors
    ///
    /// Propagates only errors from `fetch`; cache-store failures degrade to
    /// a miss.
    pub async fn read_through<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, RepositoryError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            debug!(key = key.as_str(), "cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.store(key, ttl, &value).await;
        Ok(value)
    }

    /// Look up `key`, degrading every failure mode to `None`.
    async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut conn = self.conn.clone();

        let payload: Option<String> = match conn.get(key.as_str()).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let payload = payload?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "cached payload failed to deserialize, treating as miss");
                None
            }
        }
    }

    /// Store a value under `key` with `ttl`. Failures are logged only.
    async fn store<T: Serialize>(&self, key: &CacheKey, ttl: Duration, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "failed to serialize value for cache");
                return;
            }
        };

        let mut conn = self.conn.clone();
        let result: Result<(), redis::RedisError> =
            conn.set_ex(key.as_str(), payload, ttl.as_secs()).await;
        if let Err(e) = result {
            warn!(key = key.as_str(), error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic_across_field_order() {
        let a = CacheKey::new(
            "products",
            &serde_json::json!({"category": "lips", "name": "tint"}),
        );
        let b = CacheKey::new(
            "products",
            &serde_json::json!({"name": "tint", "category": "lips"}),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_by_collection() {
        let filter = serde_json::json!({"id": "abc"});
        let a = CacheKey::new("products", &filter);
        let b = CacheKey::new("ratings", &filter);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_differs_by_filter() {
        let a = CacheKey::new("products", &serde_json::json!({"category": "lips"}));
        let b = CacheKey::new("products", &serde_json::json!({"category": "face"}));
        assert_ne!(a, b);
    }

    #[test]
    fn test_canonicalize_sorts_nested_objects() {
        let messy = serde_json::json!({
            "z": {"b": 1, "a": 2},
            "a": [{"y": 1, "x": 2}],
        });
        let canonical = canonicalize(&messy).to_string();
        assert_eq!(canonical, r#"{"a":[{"x":2,"y":1}],"z":{"a":2,"b":1}}"#);
    }

    #[test]
    fn test_key_embeds_collection_and_filter() {
        let key = CacheKey::new("products", &serde_json::json!({"all": true}));
        assert!(key.as_str().contains("\"collection\":\"products\""));
        assert!(key.as_str().contains("\"all\":true"));
    }
}
