use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::LockError;
use crate::service::{Acquire, LockService, LockToken};

/// Release only deletes the key if the stored token is ours. A plain DEL
/// could drop a rival's lock acquired after our TTL lapsed.
const RELEASE_SCRIPT: &str = r#"
    if redis.call("GET", KEYS[1]) == ARGV[1] then
        return redis.call("DEL", KEYS[1])
    else
        return 0
    end
"#;

/// Quorum lock over N independent Redis nodes.
///
/// A claim counts only if a majority of nodes accept `SET key token NX PX ttl`
/// and the total round trip leaves validity inside the TTL. Nodes are
/// deliberately not clustered; each answers for itself.
pub struct RedlockClient {
    nodes: Vec<redis::Client>,
    node_timeout: Duration,
}

impl RedlockClient {
    pub fn new(node_urls: &[String], node_timeout: Duration) -> Result<Self, LockError> {
        if node_urls.is_empty() {
            return Err(LockError::Backend("no lock nodes configured".to_string()));
        }
        let nodes = node_urls
            .iter()
            .map(|url| redis::Client::open(url.as_str()).map_err(LockError::from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { nodes, node_timeout })
    }

    fn quorum(&self) -> usize {
        self.nodes.len() / 2 + 1
    }

    async fn claim_node(
        client: &redis::Client,
        key: &str,
        token: &LockToken,
        ttl_ms: u64,
    ) -> Result<bool, LockError> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token.value())
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release_node(
        client: &redis::Client,
        key: &str,
        token: &LockToken,
    ) -> Result<(), LockError> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(key)
            .arg(token.value())
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Undo partial claims after a failed attempt. Best effort: a node that
    /// stays unreachable will drop the claim at TTL anyway.
    async fn undo_claims(&self, key: &str, token: &LockToken) {
        let undo = self.nodes.iter().map(|node| {
            tokio::time::timeout(self.node_timeout, Self::release_node(node, key, token))
        });
        for outcome in join_all(undo).await {
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!("lock undo failed on node: {}", e),
                Err(_) => debug!("lock undo timed out on node"),
            }
        }
    }
}

#[async_trait]
impl LockService for RedlockClient {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Acquire, LockError> {
        let token = LockToken::generate();
        let ttl_ms = ttl.as_millis() as u64;
        let started = tokio::time::Instant::now();

        let claims = self.nodes.iter().map(|node| {
            tokio::time::timeout(self.node_timeout, Self::claim_node(node, key, &token, ttl_ms))
        });
        let outcomes = join_all(claims).await;

        let mut accepted = 0usize;
        let mut reachable = 0usize;
        for outcome in outcomes {
            match outcome {
                Ok(Ok(true)) => {
                    accepted += 1;
                    reachable += 1;
                }
                Ok(Ok(false)) => reachable += 1,
                Ok(Err(e)) => warn!("lock node error on {}: {}", key, e),
                Err(_) => warn!("lock node timed out on {}", key),
            }
        }

        // The lock is only valid if time remains on the TTL after the round
        // trips; a claim that took longer than the TTL may already be gone.
        let within_validity = started.elapsed() < ttl;

        if accepted >= self.quorum() && within_validity {
            debug!("acquired {} on {}/{} nodes", key, accepted, self.nodes.len());
            return Ok(Acquire::Acquired(token));
        }

        self.undo_claims(key, &token).await;

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
        self.undo_claims(key, token).await;
        Ok(())
    }
}
