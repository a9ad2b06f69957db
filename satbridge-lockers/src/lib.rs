//! Locker registry for the satbridge peg.
//!
//! Lockers are federated operators custodying Bitcoin against native
//! collateral posted here. The registry runs their lifecycle (candidacy,
//! activation, inactivation, removal), enforces the collateral-ratio health
//! model, and is the only principal authorized to mint and burn the wrapped
//! ledger. Slashing is delegated to it by the burn router; anyone may top up
//! collateral, liquidate an unhealthy locker, or buy previously slashed
//! collateral.
//!
//! # State machine
//!
//! ```text
//!     request_to_become_locker
//!  ─────────────────────────►  Candidate
//!        (collateral ≥ min)      │
//!                                │ add_locker (owner)
//!                                ▼
//!            ┌──────────────  Active  ◄───────── request_activation
//!            │  mint/burn        │
//!            │                   │ request_inactivation
//!            │                   ▼
//!            │               Inactive (after INACTIVATION_DELAY)
//!            │                   │
//!            │                   │ remove_collateral / self_remove_locker
//!            ▼                   ▼
//!    liquidate_locker         Removed
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod locker;
pub mod oracle;
pub mod registry;

pub use error::{LockerError, Result, RoutingError};
pub use locker::Locker;
pub use oracle::{Asset, FixedPriceOracle, OracleError, PriceOracle};
pub use registry::{BurnRouting, LockerParams, LockerRegistry};
