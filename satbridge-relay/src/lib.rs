//! Bitcoin light-client relay interface.
//!
//! The relay is an external collaborator: it tracks the finalized Bitcoin
//! header chain and answers Merkle-inclusion queries. The peg consumes it
//! through the [`BtcRelay`] trait; [`MemoryRelay`] is the in-memory
//! implementation used by tests and local deployments.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod memory;

pub use error::{RelayError, Result};
pub use memory::MemoryRelay;

use satbridge_core::types::TxId;

/// Read-only view of a Bitcoin header relay.
pub trait BtcRelay: Send + Sync {
    /// Height of the newest submitted header.
    fn last_submitted_height(&self) -> u64;

    /// Blocks that must be mined on top of a header before it is final.
    fn finalization_parameter(&self) -> u64;

    /// Verify a Merkle branch for `txid` against the finalized header at
    /// `block_number`. `Ok(true)` only if the branch reconstructs that
    /// block's merkle root.
    fn check_tx_proof(
        &self,
        txid: &TxId,
        block_number: u64,
        proof: &[[u8; 32]],
        index: u32,
    ) -> Result<bool>;
}
