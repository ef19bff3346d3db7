use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use boxoffice_core::cache::ReservationCache;
use boxoffice_core::error::CacheError;

fn cache_err(e: redis::RedisError) -> CacheError {
    CacheError(e.to_string())
}

/// Redis-backed reservation cache: holds in-flight reservation records and
/// post-commit denial markers, both with server-side expiry.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReservationCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_err)?;
        let value: Option<String> = conn.get(key).await.map_err(cache_err)?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_err)?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
            .map_err(cache_err)?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_err)?;
        conn.del::<_, ()>(key).await.map_err(cache_err)?;
        Ok(())
    }
}
