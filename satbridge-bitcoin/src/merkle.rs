//! Merkle-branch verification for transaction inclusion.
//!
//! Bitcoin block merkle trees hash with sha256d and duplicate the last node
//! of an odd level. The relay stores only block merkle roots; inclusion is
//! proven by folding a sibling path from the txid up to the root.

use bitcoin::hashes::{sha256d, Hash};

use satbridge_core::types::TxId;

/// Verify that `txid` is a leaf of the tree with `merkle_root`, using the
/// sibling path `proof` and the leaf's `index`.
pub fn verify_inclusion(
    txid: &TxId,
    merkle_root: &[u8; 32],
    proof: &[[u8; 32]],
    index: u32,
) -> bool {
    let mut current = *txid.as_bytes();
    let mut idx = index;

    for sibling in proof {
        let mut combined = [0u8; 64];
        if idx % 2 == 0 {
            combined[..32].copy_from_slice(&current);
            combined[32..].copy_from_slice(sibling);
        } else {
            combined[..32].copy_from_slice(sibling);
            combined[32..].copy_from_slice(&current);
        }
        current = *sha256d::Hash::hash(&combined).as_byte_array();
        idx /= 2;
    }

    current == *merkle_root
}

/// Compute the merkle root of a block's txids.
pub fn merkle_root(txids: &[TxId]) -> [u8; 32] {
    assert!(!txids.is_empty(), "merkle root of empty block");

    let mut level: Vec<[u8; 32]> = txids.iter().map(|t| *t.as_bytes()).collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            let mut combined = [0u8; 64];
            combined[..32].copy_from_slice(&left);
            combined[32..].copy_from_slice(&right);
            next.push(*sha256d::Hash::hash(&combined).as_byte_array());
        }
        level = next;
    }
    level[0]
}

/// Build the sibling path proving `tx_index` within `txids`.
pub fn build_proof(txids: &[TxId], tx_index: usize) -> Option<Vec<[u8; 32]>> {
    if tx_index >= txids.len() {
        return None;
    }

    let mut proof = Vec::new();
    let mut index = tx_index;
    let mut level: Vec<[u8; 32]> = txids.iter().map(|t| *t.as_bytes()).collect();

    while level.len() > 1 {
        let sibling_index = if index % 2 == 0 { index + 1 } else { index - 1 };
        let sibling = if sibling_index < level.len() {
            level[sibling_index]
        } else {
            level[level.len() - 1]
        };
        proof.push(sibling);

        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            let mut combined = [0u8; 64];
            combined[..32].copy_from_slice(&left);
            combined[32..].copy_from_slice(&right);
            next.push(*sha256d::Hash::hash(&combined).as_byte_array());
        }
        level = next;
        index /= 2;
    }

    Some(proof)
}
