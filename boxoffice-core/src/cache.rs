use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

/// Key-value store with per-key expiry. Holds in-flight reservation records
/// and post-commit denial markers. No transactional guarantees; it may only
/// ever be trusted to *reject* a duplicate early, never to confirm one.
#[async_trait]
pub trait ReservationCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
