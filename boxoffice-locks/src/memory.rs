use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::LockError;
use crate::service::{Acquire, LockService, LockToken};

/// One simulated lock node: a key -> (token, expiry) map plus a health
/// switch. Expired entries are evicted lazily on access, which is how a TTL
/// store behaves from the outside.
struct MemoryLockNode {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    healthy: AtomicBool,
}

impl MemoryLockNode {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            healthy: AtomicBool::new(true),
        }
    }

    /// `None` means the node is down; `Some(bool)` is accept/reject.
    fn claim(&self, key: &str, token: &LockToken, ttl: Duration) -> Option<bool> {
        if !self.healthy.load(Ordering::SeqCst) {
            return None;
        }
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        if let Some((_, expires)) = entries.get(key) {
            if *expires > now {
                return Some(false);
            }
        }
        entries.insert(key.to_string(), (token.value().to_string(), now + ttl));
        Some(true)
    }

    fn release(&self, key: &str, token: &LockToken) -> Option<()> {
        if !self.healthy.load(Ordering::SeqCst) {
            return None;
        }
        let mut entries = self.entries.lock().unwrap();
        if let Some((held, _)) = entries.get(key) {
            if held == token.value() {
                entries.remove(key);
            }
        }
        Some(())
    }

    fn holds(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|(_, expires)| *expires > Instant::now())
            .unwrap_or(false)
    }
}

/// Deterministic in-memory quorum lock for tests. Same majority counting as
/// the Redis backend; nodes can be failed and restored individually to
/// simulate partial outages. Expiry rides on tokio time, so paused-clock
/// tests control it exactly.
#[derive(Clone)]
pub struct MemoryLockService {
    nodes: Vec<Arc<MemoryLockNode>>,
}

impl MemoryLockService {
    pub fn new(node_count: usize) -> Self {
        assert!(node_count > 0, "need at least one lock node");
        Self {
            nodes: (0..node_count).map(|_| Arc::new(MemoryLockNode::new())).collect(),
        }
    }

    fn quorum(&self) -> usize {
        self.nodes.len() / 2 + 1
    }

    pub fn fail_node(&self, index: usize) {
        self.nodes[index].healthy.store(false, Ordering::SeqCst);
    }

    pub fn restore_node(&self, index: usize) {
        self.nodes[index].healthy.store(true, Ordering::SeqCst);
    }

    /// True if a quorum of nodes currently holds an unexpired entry for `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        self.nodes.iter().filter(|n| n.holds(key)).count() >= self.quorum()
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Acquire, LockError> {
        let token = LockToken::generate();

        let mut accepted = 0usize;
        let mut reachable = 0usize;
        for node in &self.nodes {
            match node.claim(key, &token, ttl) {
                Some(true) => {
                    accepted += 1;
                    reachable += 1;
                }
                Some(false) => reachable += 1,
                None => {}
            }
        }

        if accepted >= self.quorum() {
            return Ok(Acquire::Acquired(token));
        }

        // Undo partial claims so a losing attempt leaves nothing behind.
        for node in &self.nodes {
            let _ = node.release(key, &token);
        }

        if reachable >= self.quorum() {
            Ok(Acquire::Contested)
        } else {
            Err(LockError::QuorumUnreachable {
                reachable,
                total: self.nodes.len(),
            })
        }
    }

    async fn release(&self, key: &str, token: &LockToken) -> Result<(), LockError> {
        for node in &self.nodes {
            let _ = node.release(key, token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn one_winner_per_key() {
        let locks = MemoryLockService::new(3);
        let first = locks.acquire("seat:5:12", TTL).await.unwrap();
        assert!(first.is_acquired());
        let second = locks.acquire("seat:5:12", TTL).await.unwrap();
        assert!(matches!(second, Acquire::Contested));
    }

    #[tokio::test]
    async fn other_keys_stay_free() {
        let locks = MemoryLockService::new(3);
        assert!(locks.acquire("seat:5:12", TTL).await.unwrap().is_acquired());
        assert!(locks.acquire("seat:5:13", TTL).await.unwrap().is_acquired());
    }

    #[tokio::test]
    async fn minority_outage_still_acquires() {
        let locks = MemoryLockService::new(5);
        locks.fail_node(0);
        locks.fail_node(1);
        assert!(locks.acquire("seat:5:12", TTL).await.unwrap().is_acquired());
    }

    #[tokio::test]
    async fn majority_outage_is_unavailable_not_contested() {
        let locks = MemoryLockService::new(5);
        for i in 0..3 {
            locks.fail_node(i);
        }
        let err = locks.acquire("seat:5:12", TTL).await.unwrap_err();
        assert!(matches!(
            err,
            LockError::QuorumUnreachable { reachable: 2, total: 5 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_frees_the_key() {
        let locks = MemoryLockService::new(3);
        assert!(locks.acquire("seat:5:12", TTL).await.unwrap().is_acquired());
        assert!(locks.is_locked("seat:5:12"));

        tokio::time::advance(TTL + Duration::from_millis(1)).await;

        assert!(!locks.is_locked("seat:5:12"));
        assert!(locks.acquire("seat:5:12", TTL).await.unwrap().is_acquired());
    }

    #[tokio::test]
    async fn release_is_idempotent_and_token_checked() {
        let locks = MemoryLockService::new(3);
        let token = match locks.acquire("seat:5:12", TTL).await.unwrap() {
            Acquire::Acquired(t) => t,
            Acquire::Contested => panic!("expected acquisition"),
        };

        locks.release("seat:5:12", &token).await.unwrap();
        locks.release("seat:5:12", &token).await.unwrap();

        // A stale token must not drop the next holder's lock.
        let rival = match locks.acquire("seat:5:12", TTL).await.unwrap() {
            Acquire::Acquired(t) => t,
            Acquire::Contested => panic!("expected acquisition after release"),
        };
        locks.release("seat:5:12", &token).await.unwrap();
        assert!(locks.is_locked("seat:5:12"));
        locks.release("seat:5:12", &rival).await.unwrap();
        assert!(!locks.is_locked("seat:5:12"));
    }

    #[tokio::test]
    async fn losing_attempt_leaves_no_partial_claims() {
        let locks = MemoryLockService::new(3);
        let holder = match locks.acquire("seat:5:12", TTL).await.unwrap() {
            Acquire::Acquired(t) => t,
            Acquire::Contested => panic!("expected acquisition"),
        };
        // Drop the holder's claim from one node so a rival can claim it
        // there but still lose the vote.
        let _ = locks.nodes[0].release("seat:5:12", &holder);

        let rival = locks.acquire("seat:5:12", TTL).await.unwrap();
        assert!(matches!(rival, Acquire::Contested));
        // The rival's partial claim on node 0 was undone.
        assert!(!locks.nodes[0].holds("seat:5:12"));
    }
}
