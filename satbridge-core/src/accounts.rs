//! Balance-sheet primitive for the target-chain native asset.
//!
//! The registry holds locker collateral in native units; modeling the asset
//! as an explicit account table keeps conservation checkable in tests. The
//! table maintains `sum(balances) == total` at all times.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{CoreError, Result};
use crate::types::Address;

/// A checked account table for a single asset.
#[derive(Debug, Default)]
pub struct Accounts {
    balances: RwLock<HashMap<Address, u128>>,
    total: RwLock<u128>,
}

impl Accounts {
    /// Create an empty account table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of an account (0 if absent).
    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances.read().get(&account).copied().unwrap_or(0)
    }

    /// Total of all balances.
    pub fn total(&self) -> u128 {
        *self.total.read()
    }

    /// Credit an account out of thin air (test setup and faucets).
    pub fn deposit(&self, account: Address, amount: u128) {
        let mut balances = self.balances.write();
        let entry = balances.entry(account).or_insert(0);
        let before = *entry;
        *entry = before.saturating_add(amount);
        let credited = *entry - before;
        *self.total.write() += credited;
    }

    /// Move `amount` from one account to another.
    pub fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<()> {
        let mut balances = self.balances.write();

        let have = balances.get(&from).copied().unwrap_or(0);
        if have < amount {
            return Err(CoreError::InsufficientBalance {
                account: from,
                need: amount,
                have,
            });
        }

        balances.insert(from, have - amount);
        let entry = balances.entry(to).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(CoreError::Overflow("accounts.transfer"))?;
        Ok(())
    }
}
