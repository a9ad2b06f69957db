//! Target-chain clock abstraction.
//!
//! Components read the host chain's block number (epoch accounting) and
//! wall clock (inactivation delays) through this trait so tests can drive
//! time explicitly.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Read-only view of the target chain's clock.
pub trait TargetChain: Send + Sync {
    /// Current block number.
    fn block_number(&self) -> u64;

    /// Current wall-clock time (unix seconds).
    fn timestamp(&self) -> i64;
}

/// Manually driven clock for tests and local deployments.
#[derive(Debug)]
pub struct ManualChain {
    block: AtomicU64,
    time: AtomicI64,
}

impl ManualChain {
    /// Start at block 0 with the current wall clock.
    pub fn new() -> Self {
        Self {
            block: AtomicU64::new(0),
            time: AtomicI64::new(chrono::Utc::now().timestamp()),
        }
    }

    /// Start at an explicit block and timestamp.
    pub fn at(block: u64, timestamp: i64) -> Self {
        Self {
            block: AtomicU64::new(block),
            time: AtomicI64::new(timestamp),
        }
    }

    /// Advance the block number.
    pub fn advance_blocks(&self, count: u64) {
        self.block.fetch_add(count, Ordering::SeqCst);
    }

    /// Set the block number.
    pub fn set_block(&self, block: u64) {
        self.block.store(block, Ordering::SeqCst);
    }

    /// Advance the wall clock.
    pub fn advance_time(&self, seconds: i64) {
        self.time.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Set the wall clock.
    pub fn set_time(&self, timestamp: i64) {
        self.time.store(timestamp, Ordering::SeqCst);
    }
}

impl Default for ManualChain {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetChain for ManualChain {
    fn block_number(&self) -> u64 {
        self.block.load(Ordering::SeqCst)
    }

    fn timestamp(&self) -> i64 {
        self.time.load(Ordering::SeqCst)
    }
}
