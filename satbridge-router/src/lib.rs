//! Burn router for the satbridge peg.
//!
//! Users redeem wrapped BTC here: `cc_burn` surrenders tokens and records a
//! time-bounded obligation on a locker, payable in BTC to the user's script.
//! Watchers discharge obligations with `burn_proof` (a relay-verified
//! Bitcoin transaction); missed deadlines are punished through
//! `dispute_burn`, and provably unauthorized locker spends through
//! `dispute_locker`. Slashing itself is delegated to the locker registry.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod request;
pub mod router;

pub use error::{Result, RouterError};
pub use request::BurnRequest;
pub use router::{BurnRouter, RouterParams};
