//! Bitcoin transaction parsing for the satbridge peg.
//!
//! A pure, side-effect-free view of Bitcoin's wire serialization: the burn
//! router verifies redemption payments and disputes malicious spends by
//! inspecting raw transactions, so parsing must be bit-exact and fail closed
//! on malformed input (no silent truncation, no out-of-bounds reads).
//!
//! - [`tx`] - legacy + segwit deserialization, txid computation, output
//!   and outpoint extraction
//! - [`script`] - the six supported output script templates
//! - [`merkle`] - merkle-branch verification against a block's root
//!
//! # Example
//!
//! ```rust
//! use satbridge_bitcoin::script;
//! use satbridge_core::types::ScriptType;
//!
//! let payload = [0x11u8; 20];
//! let spk = script::locking_script(ScriptType::P2wpkh, &payload).unwrap();
//! assert_eq!(spk, [&[0x00, 0x14][..], &payload[..]].concat());
//! assert!(script::matches(&spk, ScriptType::P2wpkh, &payload));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod merkle;
pub mod reader;
pub mod script;
pub mod tx;

pub use error::{Result, TxParseError};
pub use merkle::verify_inclusion;
pub use tx::{ParsedInput, ParsedOutput, ParsedTransaction};
