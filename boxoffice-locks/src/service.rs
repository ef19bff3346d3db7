use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LockError;

/// Opaque ownership token, unique per acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(String);

impl LockToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LockToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of an acquisition attempt that reached quorum.
#[derive(Debug)]
pub enum Acquire {
    Acquired(LockToken),
    /// A rival holder owns the key. Legitimate contention, distinct from
    /// `LockError::QuorumUnreachable`.
    Contested,
}

impl Acquire {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Acquire::Acquired(_))
    }
}

#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempt to claim `key` for `ttl`. Returns `Contested` when a rival
    /// holds the key, and errs only on infrastructure failure. Never blocks
    /// past the node round-trip budget; never retries internally.
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Acquire, LockError>;

    /// Release a held lock. Idempotent: an expired or unknown token is a
    /// no-op, and a token held by someone else is never deleted.
    async fn release(&self, key: &str, token: &LockToken) -> Result<(), LockError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_per_attempt() {
        let a = LockToken::generate();
        let b = LockToken::generate();
        assert_ne!(a, b);
        assert!(!a.value().is_empty());
    }
}
