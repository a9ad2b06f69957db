//! Identity and Bitcoin-script types.
//!
//! Contract-style identity is modeled explicitly: every component instance
//! and every principal is an [`Address`], and every external operation takes
//! the caller's address as its first argument.

use serde::{Deserialize, Serialize};

/// A 20-byte target-chain account address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Never a valid principal.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build an address with every byte set to `byte` (test fixtures).
    pub fn repeat(byte: u8) -> Self {
        Address([byte; 20])
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A Bitcoin transaction id (sha256d of the stripped serialization).
///
/// Stored in internal (little-endian) byte order; displayed reversed, the
/// Bitcoin convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    /// The all-zero txid (coinbase previous-output marker).
    pub const ZERO: TxId = TxId([0u8; 32]);

    /// Raw bytes in internal order.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

/// Supported Bitcoin output script templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    /// Pay to public key.
    P2pk,
    /// Pay to public key hash.
    P2pkh,
    /// Pay to script hash.
    P2sh,
    /// Pay to witness public key hash.
    P2wpkh,
    /// Pay to witness script hash.
    P2wsh,
    /// Pay to taproot.
    P2tr,
}

impl ScriptType {
    /// Expected payload length for this template: 20 bytes for the hash160
    /// families, 32 bytes for the key/script-hash families.
    pub fn payload_len(&self) -> usize {
        match self {
            ScriptType::P2pkh | ScriptType::P2sh | ScriptType::P2wpkh => 20,
            ScriptType::P2pk | ScriptType::P2wsh | ScriptType::P2tr => 32,
        }
    }
}

/// Raw Bitcoin script bytes identifying a UTXO destination.
///
/// Used both for locker locking scripts (full scriptPubKey) and for user
/// redemption payloads (raw hash/key payload, typed by [`ScriptType`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockingScript(pub Vec<u8>);

impl LockingScript {
    /// Wrap raw script bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        LockingScript(bytes.into())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Script length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the script is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for LockingScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for LockingScript {
    fn from(bytes: Vec<u8>) -> Self {
        LockingScript(bytes)
    }
}

impl From<&[u8]> for LockingScript {
    fn from(bytes: &[u8]) -> Self {
        LockingScript(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let addr = Address::repeat(0xab);
        assert_eq!(
            addr.to_string(),
            "0xabababababababababababababababababababab"
        );
        assert!(!addr.is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_txid_display_is_reversed() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        let txid = TxId(bytes);
        // Internal order puts 0x01 first; display reverses it to the end.
        assert!(txid.to_string().ends_with("01"));
        assert!(txid.to_string().starts_with("00"));
    }

    #[test]
    fn test_script_type_payload_len() {
        assert_eq!(ScriptType::P2pkh.payload_len(), 20);
        assert_eq!(ScriptType::P2sh.payload_len(), 20);
        assert_eq!(ScriptType::P2wpkh.payload_len(), 20);
        assert_eq!(ScriptType::P2pk.payload_len(), 32);
        assert_eq!(ScriptType::P2wsh.payload_len(), 32);
        assert_eq!(ScriptType::P2tr.payload_len(), 32);
    }

    #[test]
    fn test_locking_script_roundtrip() {
        let script = LockingScript::new(vec![0x00, 0x14, 0xaa]);
        assert_eq!(script.len(), 3);
        assert_eq!(script.to_string(), "0014aa");
    }
}
