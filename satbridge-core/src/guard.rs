//! Admission gates for component operations.
//!
//! Ownership, pausing and reentrancy protection are orthogonal concerns;
//! each is a small standalone guard a component composes explicitly rather
//! than inherits.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{CoreError, Result};
use crate::types::Address;

/// Owner gate. Holds the owning address; owner is replaceable but never zero.
#[derive(Debug)]
pub struct Ownable {
    owner: RwLock<Address>,
}

impl Ownable {
    /// Create with an initial owner.
    pub fn new(owner: Address) -> Result<Self> {
        if owner.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        Ok(Self {
            owner: RwLock::new(owner),
        })
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        *self.owner.read()
    }

    /// Reject callers other than the owner.
    pub fn only(&self, caller: Address) -> Result<()> {
        if caller == self.owner() {
            Ok(())
        } else {
            Err(CoreError::NotOwner { caller })
        }
    }

    /// Hand ownership to a new address. Owner-gated, zero rejected.
    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        self.only(caller)?;
        if new_owner.is_zero() {
            return Err(CoreError::ZeroAddress);
        }
        *self.owner.write() = new_owner;
        Ok(())
    }
}

/// Pause switch for user-facing entry points.
#[derive(Debug, Default)]
pub struct Pausable {
    paused: AtomicBool,
}

impl Pausable {
    /// Create unpaused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the component is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Pause.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Unpause.
    pub fn unpause(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Reject while paused.
    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.is_paused() {
            Err(CoreError::Paused)
        } else {
            Ok(())
        }
    }
}

/// Single-bit reentrancy guard covering all guarded operations of one
/// component instance.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    /// Create an unentered guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard for the duration of the returned token.
    pub fn enter(&self) -> Result<ReentrancyToken<'_>> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::Reentrancy);
        }
        Ok(ReentrancyToken { guard: self })
    }
}

/// RAII token releasing the reentrancy bit on drop.
#[derive(Debug)]
pub struct ReentrancyToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for ReentrancyToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::SeqCst);
    }
}
