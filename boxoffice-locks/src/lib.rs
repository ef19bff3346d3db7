//! Distributed mutual exclusion for contested seats.
//!
//! A lock is only considered held once a majority of independent lock nodes
//! accept the claim within a bounded round-trip budget. Two backends:
//!
//! - `RedlockClient`: production backend over N independent Redis nodes.
//! - `MemoryLockService`: deterministic multi-node fake for tests, with
//!   per-node fail switches to simulate partial outages.

pub mod error;
pub mod memory;
pub mod redlock;
pub mod service;

pub use error::LockError;
pub use memory::MemoryLockService;
pub use redlock::RedlockClient;
pub use service::{Acquire, LockService, LockToken};
