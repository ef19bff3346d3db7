use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    /// Fewer than a majority of lock nodes answered within the round-trip
    /// budget. Transient infrastructure fault, not contention.
    #[error("lock quorum unreachable: {reachable} of {total} nodes answered")]
    QuorumUnreachable { reachable: usize, total: usize },

    #[error("lock backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for LockError {
    fn from(err: redis::RedisError) -> Self {
        LockError::Backend(err.to_string())
    }
}
