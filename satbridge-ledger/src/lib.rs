//! Wrapped-BTC ledger for the satbridge peg.
//!
//! A fungible balance store with 8 decimal places (1 BTC = 10^8 units).
//! Minting and burning are restricted to role-granted component addresses
//! (the locker registry in practice), minting is throttled per target-chain
//! epoch, and a blacklist gate sits in the pre-transfer hook so blacklisted
//! accounts can neither send, receive, be minted to nor burn - except
//! through the owner's override.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod ledger;

pub use error::{LedgerError, Result};
pub use ledger::{LedgerConfig, Role, WrappedLedger};
