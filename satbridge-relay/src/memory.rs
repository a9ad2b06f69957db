//! In-memory relay backed by a height-indexed root store.
//!
//! Stores one merkle root per Bitcoin height. Tests drive it directly:
//! submit a block containing the transaction under test, then pad the chain
//! until the block is finalized.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use satbridge_bitcoin::merkle;
use satbridge_core::types::TxId;

use crate::error::{RelayError, Result};
use crate::BtcRelay;

/// Height-indexed merkle-root store implementing [`BtcRelay`].
#[derive(Debug)]
pub struct MemoryRelay {
    roots: RwLock<BTreeMap<u64, [u8; 32]>>,
    finalization_parameter: u64,
}

impl MemoryRelay {
    /// Create a relay whose first submitted block lands at `base_height`.
    pub fn new(base_height: u64, finalization_parameter: u64) -> Self {
        let mut roots = BTreeMap::new();
        // Seed the chain so `last_submitted_height` starts at base_height.
        roots.insert(base_height, [0u8; 32]);
        Self {
            roots: RwLock::new(roots),
            finalization_parameter,
        }
    }

    /// Append a block with the given merkle root; returns its height.
    pub fn submit_root(&self, root: [u8; 32]) -> u64 {
        let mut roots = self.roots.write();
        let height = roots.keys().next_back().copied().map_or(0, |h| h + 1);
        roots.insert(height, root);
        tracing::debug!(height, "relay accepted block root");
        height
    }

    /// Append a block whose only relevant content is `txids`; returns the
    /// block height.
    pub fn submit_block(&self, txids: &[TxId]) -> u64 {
        self.submit_root(merkle::merkle_root(txids))
    }

    /// Append `count` empty blocks (advances the tip past finalization).
    pub fn advance(&self, count: u64) {
        for _ in 0..count {
            self.submit_root([0u8; 32]);
        }
    }

    /// Merkle root stored at `height`.
    pub fn root_at(&self, height: u64) -> Option<[u8; 32]> {
        self.roots.read().get(&height).copied()
    }
}

impl BtcRelay for MemoryRelay {
    fn last_submitted_height(&self) -> u64 {
        self.roots
            .read()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    fn finalization_parameter(&self) -> u64 {
        self.finalization_parameter
    }

    fn check_tx_proof(
        &self,
        txid: &TxId,
        block_number: u64,
        proof: &[[u8; 32]],
        index: u32,
    ) -> Result<bool> {
        let root = self
            .root_at(block_number)
            .ok_or(RelayError::MissingHeader(block_number))?;

        let tip = self.last_submitted_height();
        if tip < block_number + self.finalization_parameter {
            return Err(RelayError::NotFinalized {
                height: block_number,
                tip,
                need: self.finalization_parameter,
            });
        }

        Ok(merkle::verify_inclusion(txid, &root, proof, index))
    }
}
