//! Output script templates.
//!
//! The peg supports six scriptPubKey shapes. A template is fully determined
//! by the script type and its raw payload, so matching is exact byte
//! equality against the rebuilt script.

use satbridge_core::types::ScriptType;

use crate::error::{Result, TxParseError};

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const PUSH_20: u8 = 0x14;
const PUSH_32: u8 = 0x20;

/// Build the canonical scriptPubKey for a script type and payload.
///
/// | Type   | Shape                                              |
/// |--------|----------------------------------------------------|
/// | P2PK   | `<pubkey:32> OP_CHECKSIG`                          |
/// | P2PKH  | `OP_DUP OP_HASH160 0x14 <hash:20> OP_EQUALVERIFY OP_CHECKSIG` |
/// | P2SH   | `OP_HASH160 0x14 <hash:20> OP_EQUAL`               |
/// | P2WPKH | `0x00 0x14 <hash:20>`                              |
/// | P2WSH  | `0x00 0x20 <hash:32>`                              |
/// | P2TR   | `0x51 0x20 <key:32>`                               |
pub fn locking_script(script_type: ScriptType, payload: &[u8]) -> Result<Vec<u8>> {
    let expected = script_type.payload_len();
    if payload.len() != expected {
        return Err(TxParseError::BadPayloadLength {
            script_type,
            expected,
            got: payload.len(),
        });
    }

    let mut script = Vec::with_capacity(expected + 5);
    match script_type {
        ScriptType::P2pk => {
            script.extend_from_slice(payload);
            script.push(OP_CHECKSIG);
        }
        ScriptType::P2pkh => {
            script.extend_from_slice(&[OP_DUP, OP_HASH160, PUSH_20]);
            script.extend_from_slice(payload);
            script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        }
        ScriptType::P2sh => {
            script.extend_from_slice(&[OP_HASH160, PUSH_20]);
            script.extend_from_slice(payload);
            script.push(OP_EQUAL);
        }
        ScriptType::P2wpkh => {
            script.extend_from_slice(&[OP_0, PUSH_20]);
            script.extend_from_slice(payload);
        }
        ScriptType::P2wsh => {
            script.extend_from_slice(&[OP_0, PUSH_32]);
            script.extend_from_slice(payload);
        }
        ScriptType::P2tr => {
            script.extend_from_slice(&[OP_1, PUSH_32]);
            script.extend_from_slice(payload);
        }
    }
    Ok(script)
}

/// Whether `script_pubkey` is exactly the template for `payload` under
/// `script_type`. A payload of the wrong length matches nothing.
pub fn matches(script_pubkey: &[u8], script_type: ScriptType, payload: &[u8]) -> bool {
    match locking_script(script_type, payload) {
        Ok(expected) => script_pubkey == expected.as_slice(),
        Err(_) => false,
    }
}
