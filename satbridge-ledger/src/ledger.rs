//! The wrapped-BTC token.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use satbridge_core::chain::TargetChain;
use satbridge_core::error::CoreError;
use satbridge_core::events::{BridgeEvent, EventLog};
use satbridge_core::guard::Ownable;
use satbridge_core::types::Address;
use satbridge_core::WRAPPED_DECIMALS;

use crate::error::{LedgerError, Result};

/// Roles an account can hold on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May call `mint`.
    Minter,
    /// May call `burn`.
    Burner,
    /// May manage the blacklist.
    Blacklister,
}

/// Ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Epoch length in target-chain blocks.
    pub epoch_length: u64,
    /// Maximum mintable per epoch (and per single mint).
    pub max_mint_limit: u128,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            epoch_length: 100,
            // 10 BTC per epoch.
            max_mint_limit: 10 * 100_000_000,
        }
    }
}

impl LedgerConfig {
    /// Set the epoch length.
    pub fn with_epoch_length(mut self, epoch_length: u64) -> Self {
        self.epoch_length = epoch_length;
        self
    }

    /// Set the per-epoch mint limit.
    pub fn with_max_mint_limit(mut self, max_mint_limit: u128) -> Self {
        self.max_mint_limit = max_mint_limit;
        self
    }
}

#[derive(Debug)]
struct LedgerState {
    balances: HashMap<Address, u128>,
    total_supply: u128,
    allowances: HashMap<(Address, Address), u128>,
    minters: HashSet<Address>,
    burners: HashSet<Address>,
    blacklisters: HashSet<Address>,
    blacklist: HashSet<Address>,
    epoch_length: u64,
    max_mint_limit: u128,
    last_epoch: u64,
    last_mint_limit: u128,
}

/// The wrapped-BTC token ledger.
pub struct WrappedLedger {
    ownable: Ownable,
    chain: Arc<dyn TargetChain>,
    log: Arc<EventLog>,
    state: RwLock<LedgerState>,
}

impl WrappedLedger {
    /// Create a ledger owned by `owner`.
    pub fn new(
        owner: Address,
        config: LedgerConfig,
        chain: Arc<dyn TargetChain>,
        log: Arc<EventLog>,
    ) -> Result<Self> {
        if config.epoch_length == 0 {
            return Err(LedgerError::ZeroEpochLength);
        }
        Ok(Self {
            ownable: Ownable::new(owner)?,
            chain,
            log,
            state: RwLock::new(LedgerState {
                balances: HashMap::new(),
                total_supply: 0,
                allowances: HashMap::new(),
                minters: HashSet::new(),
                burners: HashSet::new(),
                blacklisters: HashSet::new(),
                blacklist: HashSet::new(),
                epoch_length: config.epoch_length,
                max_mint_limit: config.max_mint_limit,
                last_epoch: 0,
                last_mint_limit: config.max_mint_limit,
            }),
        })
    }

    /// Decimal places of the token. Fixed: wrapping must be sat-exact.
    pub fn decimals(&self) -> u8 {
        WRAPPED_DECIMALS
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    /// Hand ownership to a new address.
    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        Ok(self.ownable.transfer_ownership(caller, new_owner)?)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Balance of an account.
    pub fn balance_of(&self, account: Address) -> u128 {
        self.state
            .read()
            .balances
            .get(&account)
            .copied()
            .unwrap_or(0)
    }

    /// Total token supply.
    pub fn total_supply(&self) -> u128 {
        self.state.read().total_supply
    }

    /// Remaining allowance of `spender` over `owner`'s balance.
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.state
            .read()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `account` holds `role`. The zero address holds nothing and is
    /// rejected outright.
    pub fn has_role(&self, account: Address, role: Role) -> Result<bool> {
        if account.is_zero() {
            return Err(LedgerError::Core(CoreError::ZeroAddress));
        }
        let state = self.state.read();
        Ok(match role {
            Role::Minter => state.minters.contains(&account),
            Role::Burner => state.burners.contains(&account),
            Role::Blacklister => state.blacklisters.contains(&account),
        })
    }

    /// Whether `account` is blacklisted. The zero address is permitted here
    /// and is never blacklisted.
    pub fn is_blacklisted(&self, account: Address) -> bool {
        self.state.read().blacklist.contains(&account)
    }

    /// Mint budget remaining in the current epoch.
    pub fn epoch_budget_remaining(&self) -> u128 {
        let state = self.state.read();
        let epoch = self.chain.block_number() / state.epoch_length;
        if epoch == state.last_epoch {
            state.last_mint_limit
        } else {
            state.max_mint_limit
        }
    }

    // ------------------------------------------------------------------
    // Role and blacklist administration
    // ------------------------------------------------------------------

    /// Grant a role. Owner-gated; duplicate grants rejected.
    pub fn add_role(&self, caller: Address, account: Address, role: Role) -> Result<()> {
        self.ownable.only(caller)?;
        if account.is_zero() {
            return Err(LedgerError::Core(CoreError::ZeroAddress));
        }
        let mut state = self.state.write();
        let set = match role {
            Role::Minter => &mut state.minters,
            Role::Burner => &mut state.burners,
            Role::Blacklister => &mut state.blacklisters,
        };
        if !set.insert(account) {
            return Err(LedgerError::RoleAlreadyGranted { account, role });
        }
        tracing::info!(%account, ?role, "role granted");
        Ok(())
    }

    /// Revoke a role. Owner-gated; absent grants rejected.
    pub fn remove_role(&self, caller: Address, account: Address, role: Role) -> Result<()> {
        self.ownable.only(caller)?;
        let mut state = self.state.write();
        let set = match role {
            Role::Minter => &mut state.minters,
            Role::Burner => &mut state.burners,
            Role::Blacklister => &mut state.blacklisters,
        };
        if !set.remove(&account) {
            return Err(LedgerError::RoleNotGranted { account, role });
        }
        tracing::info!(%account, ?role, "role revoked");
        Ok(())
    }

    /// Blacklist an account. Blacklister-gated.
    pub fn blacklist(&self, caller: Address, account: Address) -> Result<()> {
        self.require_role(caller, Role::Blacklister)?;
        let mut state = self.state.write();
        if !state.blacklist.insert(account) {
            return Err(LedgerError::Blacklisted { account });
        }
        drop(state);
        self.log.emit(BridgeEvent::Blacklisted { account });
        Ok(())
    }

    /// Remove an account from the blacklist. Blacklister-gated.
    pub fn un_blacklist(&self, caller: Address, account: Address) -> Result<()> {
        self.require_role(caller, Role::Blacklister)?;
        let mut state = self.state.write();
        if !state.blacklist.remove(&account) {
            return Err(LedgerError::NotBlacklisted { account });
        }
        drop(state);
        self.log.emit(BridgeEvent::UnBlacklisted { account });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Epoch configuration
    // ------------------------------------------------------------------

    /// Set the epoch length in blocks. Owner-gated, must be non-zero.
    pub fn set_epoch_length(&self, caller: Address, epoch_length: u64) -> Result<()> {
        self.ownable.only(caller)?;
        if epoch_length == 0 {
            return Err(LedgerError::ZeroEpochLength);
        }
        self.state.write().epoch_length = epoch_length;
        Ok(())
    }

    /// Set the per-epoch mint limit. Owner-gated.
    pub fn set_max_mint_limit(&self, caller: Address, max_mint_limit: u128) -> Result<()> {
        self.ownable.only(caller)?;
        self.state.write().max_mint_limit = max_mint_limit;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Supply movement
    // ------------------------------------------------------------------

    /// Mint `amount` to `to`. Minter-gated and epoch-throttled.
    ///
    /// The throttle is a sliding window per epoch, not a token bucket:
    /// rolling into a new epoch discards any unused budget.
    pub fn mint(&self, caller: Address, to: Address, amount: u128) -> Result<()> {
        self.require_role(caller, Role::Minter)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(LedgerError::Core(CoreError::ZeroAddress));
        }

        let mut state = self.state.write();
        if state.blacklist.contains(&to) {
            return Err(LedgerError::Blacklisted { account: to });
        }
        if amount > state.max_mint_limit {
            return Err(LedgerError::OverMintLimit {
                amount,
                max: state.max_mint_limit,
            });
        }

        let epoch = self.chain.block_number() / state.epoch_length;
        if epoch == state.last_epoch {
            if state.last_mint_limit < amount {
                return Err(LedgerError::EpochBudgetExceeded {
                    requested: amount,
                    remaining: state.last_mint_limit,
                });
            }
            state.last_mint_limit -= amount;
        } else {
            state.last_epoch = epoch;
            state.last_mint_limit = state.max_mint_limit - amount;
        }

        let balance = state.balances.entry(to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(CoreError::Overflow("ledger.mint"))?;
        state.total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(CoreError::Overflow("ledger.mint"))?;
        drop(state);

        self.log.emit(BridgeEvent::Mint { to, amount });
        Ok(())
    }

    /// Burn `amount` from the caller's balance. Burner-gated.
    pub fn burn(&self, caller: Address, amount: u128) -> Result<()> {
        self.require_role(caller, Role::Burner)?;
        if self.is_blacklisted(caller) {
            return Err(LedgerError::Blacklisted { account: caller });
        }
        self.burn_unchecked(caller, amount)
    }

    /// Burn `amount` from an arbitrary account, bypassing the blacklist.
    /// Owner-gated override.
    pub fn owner_burn(&self, caller: Address, user: Address, amount: u128) -> Result<()> {
        self.ownable.only(caller)?;
        self.burn_unchecked(user, amount)
    }

    /// Move `amount` from the caller to `to`.
    pub fn transfer(&self, caller: Address, to: Address, amount: u128) -> Result<()> {
        self.move_tokens(caller, to, amount)
    }

    /// Move `amount` from `from` to `to` consuming the caller's allowance.
    pub fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        {
            let mut state = self.state.write();
            let allowance = state.allowances.get(&(from, caller)).copied().unwrap_or(0);
            if allowance < amount {
                return Err(LedgerError::InsufficientAllowance {
                    owner: from,
                    spender: caller,
                    need: amount,
                    have: allowance,
                });
            }
            state.allowances.insert((from, caller), allowance - amount);
        }
        match self.move_tokens(from, to, amount) {
            Ok(()) => Ok(()),
            Err(e) => {
                // The failed move must not consume allowance.
                let mut state = self.state.write();
                let allowance = state.allowances.get(&(from, caller)).copied().unwrap_or(0);
                state
                    .allowances
                    .insert((from, caller), allowance.saturating_add(amount));
                Err(e)
            }
        }
    }

    /// Authorize `spender` to move up to `amount` of the caller's balance.
    pub fn approve(&self, caller: Address, spender: Address, amount: u128) -> Result<()> {
        if spender.is_zero() {
            return Err(LedgerError::Core(CoreError::ZeroAddress));
        }
        self.state.write().allowances.insert((caller, spender), amount);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_role(&self, caller: Address, role: Role) -> Result<()> {
        if self.has_role(caller, role)? {
            Ok(())
        } else {
            Err(LedgerError::MissingRole { caller, role })
        }
    }

    /// Pre-transfer hook + balance movement: neither endpoint blacklisted.
    fn move_tokens(&self, from: Address, to: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(LedgerError::Core(CoreError::ZeroAddress));
        }

        let mut state = self.state.write();
        if state.blacklist.contains(&from) {
            return Err(LedgerError::Blacklisted { account: from });
        }
        if state.blacklist.contains(&to) {
            return Err(LedgerError::Blacklisted { account: to });
        }

        let have = state.balances.get(&from).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::Core(CoreError::InsufficientBalance {
                account: from,
                need: amount,
                have,
            }));
        }
        state.balances.insert(from, have - amount);
        let to_balance = state.balances.entry(to).or_insert(0);
        *to_balance = to_balance
            .checked_add(amount)
            .ok_or(CoreError::Overflow("ledger.transfer"))?;
        Ok(())
    }

    fn burn_unchecked(&self, from: Address, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let mut state = self.state.write();
        let have = state.balances.get(&from).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::Core(CoreError::InsufficientBalance {
                account: from,
                need: amount,
                have,
            }));
        }
        state.balances.insert(from, have - amount);
        state.total_supply -= amount;
        drop(state);

        self.log.emit(BridgeEvent::Burn { from, amount });
        Ok(())
    }
}
