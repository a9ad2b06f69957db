//! Satbridge Core - Fundamental types for the satbridge two-way peg.
//!
//! This crate provides the data structures and cross-cutting primitives
//! shared by the peg subsystems:
//!
//! - [`types`] - Addresses, transaction ids, Bitcoin script identifiers
//! - [`accounts`] - A checked balance sheet used for native collateral
//! - [`events`] - The observable event log emitted by every component
//! - [`guard`] - Ownership, pause and reentrancy admission gates
//! - [`chain`] - Target-chain clock abstraction (block height + wall clock)
//! - [`math`] - Checked monetary arithmetic
//!
//! # Example
//!
//! ```rust
//! use satbridge_core::{accounts::Accounts, types::Address};
//!
//! let bank = Accounts::new();
//! let alice = Address::repeat(0x11);
//! let bob = Address::repeat(0x22);
//!
//! bank.deposit(alice, 1_000);
//! bank.transfer(alice, bob, 400).unwrap();
//!
//! assert_eq!(bank.balance_of(bob), 400);
//! assert_eq!(bank.total(), 1_000);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod accounts;
pub mod chain;
pub mod error;
pub mod events;
pub mod guard;
pub mod math;
pub mod types;

// Re-exports for convenience
pub use accounts::Accounts;
pub use chain::{ManualChain, TargetChain};
pub use error::{CoreError, Result};
pub use events::{BridgeEvent, EventLog, SlashKind};
pub use guard::{Ownable, Pausable, ReentrancyGuard};
pub use types::{Address, LockingScript, ScriptType, TxId};

/// Decimal places of the wrapped-BTC unit (1 BTC = 10^8 units).
pub const WRAPPED_DECIMALS: u8 = 8;

/// Decimal places of the target-chain native unit.
pub const NATIVE_DECIMALS: u8 = 18;

/// Denominator for the protocol fee ratio ("100%").
pub const MAX_PROTOCOL_FEE: u128 = 10_000;

/// Denominator for the locker fee ratio ("100%").
pub const MAX_LOCKER_FEE: u128 = 10_000;

/// Denominator for the slasher reward ratio ("100%").
pub const MAX_SLASHER_REWARD: u128 = 10_000;

/// Denominator for the slashed-collateral price discount ("100%").
pub const MAX_PRICE_DISCOUNT: u128 = 10_000;

/// Liquidation trigger: a locker with health factor below this is liquidatable.
pub const HEALTH_FACTOR: u128 = 10_000;

/// Scaling constant in the health-factor numerator; shares the
/// collateral-ratio denomination.
pub const UPPER_HEALTH_FACTOR: u128 = 10_000;

/// Seconds between an inactivation request and the locker becoming inactive.
pub const INACTIVATION_DELAY: i64 = 345_600;
