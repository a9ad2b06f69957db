//! The locker registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use satbridge_core::accounts::Accounts;
use satbridge_core::chain::TargetChain;
use satbridge_core::events::{BridgeEvent, EventLog, SlashKind};
use satbridge_core::guard::{Ownable, ReentrancyGuard};
use satbridge_core::math;
use satbridge_core::types::{Address, LockingScript, ScriptType, TxId};
use satbridge_core::{
    HEALTH_FACTOR, INACTIVATION_DELAY, MAX_LOCKER_FEE, MAX_PRICE_DISCOUNT, NATIVE_DECIMALS,
    UPPER_HEALTH_FACTOR, WRAPPED_DECIMALS,
};
use satbridge_ledger::WrappedLedger;

use crate::error::{LockerError, Result, RoutingError};
use crate::locker::Locker;
use crate::oracle::{Asset, PriceOracle};

/// Burn-request creation as seen from the registry.
///
/// Liquidation routes the buyer's wrapped BTC through the burn router
/// against the locker's rescue script; this trait is the injected,
/// owner-replaceable handle that breaks the router/registry cycle.
pub trait BurnRouting: Send + Sync {
    /// Create a burn obligation of `amount` payable to `user_script`.
    /// Returns the post-fee amount the locker owes in BTC.
    fn route_burn(
        &self,
        caller: Address,
        amount: u128,
        user_script: &LockingScript,
        script_type: ScriptType,
        locker_script: &LockingScript,
    ) -> std::result::Result<u128, RoutingError>;
}

/// Tunable registry parameters. Ratios share the 10_000 = 100% denomination.
#[derive(Debug, Clone)]
pub struct LockerParams {
    /// Over-collateralization required to mint (e.g. 20_000 = 200%).
    pub collateral_ratio: u128,
    /// Collateralization below which a locker is liquidatable.
    pub liquidation_ratio: u128,
    /// Discount applied to the oracle price when selling slashed collateral.
    pub price_with_discount_ratio: u128,
    /// Locker fee taken on mints and burns.
    pub locker_percentage_fee: u128,
    /// Minimum native collateral for candidacy.
    pub min_required_locked_amount: u128,
}

impl Default for LockerParams {
    fn default() -> Self {
        Self {
            collateral_ratio: 20_000,
            liquidation_ratio: 15_000,
            price_with_discount_ratio: 9_500,
            locker_percentage_fee: 20,
            min_required_locked_amount: 5_000_000_000_000_000_000,
        }
    }
}

impl LockerParams {
    /// Set the collateral ratio.
    pub fn with_collateral_ratio(mut self, ratio: u128) -> Self {
        self.collateral_ratio = ratio;
        self
    }

    /// Set the liquidation ratio.
    pub fn with_liquidation_ratio(mut self, ratio: u128) -> Self {
        self.liquidation_ratio = ratio;
        self
    }

    /// Set the slashed-collateral price discount.
    pub fn with_price_discount(mut self, ratio: u128) -> Self {
        self.price_with_discount_ratio = ratio;
        self
    }

    /// Set the locker fee.
    pub fn with_locker_fee(mut self, fee: u128) -> Self {
        self.locker_percentage_fee = fee;
        self
    }

    /// Set the candidacy collateral floor.
    pub fn with_min_locked(mut self, min: u128) -> Self {
        self.min_required_locked_amount = min;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.liquidation_ratio == 0 || self.liquidation_ratio >= self.collateral_ratio {
            return Err(LockerError::RatioOutOfRange {
                what: "liquidation_ratio",
                value: self.liquidation_ratio,
            });
        }
        if self.price_with_discount_ratio > MAX_PRICE_DISCOUNT {
            return Err(LockerError::RatioOutOfRange {
                what: "price_with_discount_ratio",
                value: self.price_with_discount_ratio,
            });
        }
        if self.locker_percentage_fee > MAX_LOCKER_FEE {
            return Err(LockerError::RatioOutOfRange {
                what: "locker_percentage_fee",
                value: self.locker_percentage_fee,
            });
        }
        if self.min_required_locked_amount == 0 {
            return Err(LockerError::RatioOutOfRange {
                what: "min_required_locked_amount",
                value: 0,
            });
        }
        Ok(())
    }
}

/// Registry of Bitcoin-custody lockers and their collateral.
pub struct LockerRegistry {
    address: Address,
    ownable: Ownable,
    guard: ReentrancyGuard,
    chain: Arc<dyn TargetChain>,
    log: Arc<EventLog>,
    native: Arc<Accounts>,
    ledger: RwLock<Arc<WrappedLedger>>,
    oracle: RwLock<Arc<dyn PriceOracle>>,
    router: RwLock<Option<(Address, Arc<dyn BurnRouting>)>>,
    minters: RwLock<HashSet<Address>>,
    burners: RwLock<HashSet<Address>>,
    params: RwLock<LockerParams>,
    lockers: RwLock<HashMap<Address, Locker>>,
    script_index: RwLock<HashMap<LockingScript, Address>>,
}

impl LockerRegistry {
    /// Create a registry at `address`, owned by `owner`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: Address,
        owner: Address,
        params: LockerParams,
        chain: Arc<dyn TargetChain>,
        log: Arc<EventLog>,
        native: Arc<Accounts>,
        ledger: Arc<WrappedLedger>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Result<Self> {
        params.validate()?;
        if address.is_zero() {
            return Err(LockerError::Core(
                satbridge_core::error::CoreError::ZeroAddress,
            ));
        }
        Ok(Self {
            address,
            ownable: Ownable::new(owner)?,
            guard: ReentrancyGuard::new(),
            chain,
            log,
            native,
            ledger: RwLock::new(ledger),
            oracle: RwLock::new(oracle),
            router: RwLock::new(None),
            minters: RwLock::new(HashSet::new()),
            burners: RwLock::new(HashSet::new()),
            params: RwLock::new(params),
            lockers: RwLock::new(HashMap::new()),
            script_index: RwLock::new(HashMap::new()),
        })
    }

    /// The registry's own component address.
    pub fn address(&self) -> Address {
        self.address
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

    /// Snapshot of a locker record.
    pub fn locker(&self, target: Address) -> Option<Locker> {
        self.lockers.read().get(&target).cloned()
    }

    /// Target address of the approved locker controlling `script`.
    pub fn locker_target_address(&self, script: &LockingScript) -> Option<Address> {
        let target = self.script_index.read().get(script).copied()?;
        let lockers = self.lockers.read();
        lockers
            .get(&target)
            .filter(|l| l.is_locker)
            .map(|_| target)
    }

    /// Remaining mintable amount against the locker's collateral.
    pub fn locker_capacity(&self, target: Address) -> Result<u128> {
        let locker = self
            .locker(target)
            .ok_or(LockerError::LockerNotFound { target })?;
        let cap = self.capacity_total(locker.native_locked)?;
        Ok(cap.saturating_sub(locker.net_minted))
    }

    /// Health factor, `None` when nothing is minted (never liquidatable).
    pub fn health_factor(&self, target: Address) -> Result<Option<u128>> {
        let locker = self
            .locker(target)
            .ok_or(LockerError::LockerNotFound { target })?;
        self.health_of(&locker)
    }

    /// Whether the locker is below the liquidation trigger.
    pub fn is_liquidatable(&self, target: Address) -> Result<bool> {
        Ok(self
            .health_factor(target)?
            .map(|hf| hf < HEALTH_FACTOR)
            .unwrap_or(false))
    }

    /// Largest collateral amount a liquidator may currently buy.
    pub fn maximum_buyable_collateral(&self, target: Address) -> Result<u128> {
        let locker = self
            .locker(target)
            .ok_or(LockerError::LockerNotFound { target })?;
        match self.health_of(&locker)? {
            Some(hf) if hf < HEALTH_FACTOR => {}
            _ => return Ok(0),
        }

        let params = self.params.read().clone();
        let value_btc = self.collateral_value_btc(locker.native_locked)?;

        // Collateral purchased at discount retires less debt than its fair
        // value; the position is only restorable when the discounted
        // liquidation ratio still exceeds 100%.
        let den = params
            .price_with_discount_ratio
            .checked_mul(params.liquidation_ratio)
            .ok_or(satbridge_core::error::CoreError::Overflow("max_buyable"))?;
        if den <= 100_000_000 {
            return Ok(locker.native_locked);
        }

        // Smallest v (in BTC value) restoring health to the trigger:
        // (value - v) * 10^4 = (net_minted - v*d/10^4) * liquidation_ratio
        let shortfall = math::sub(
            math::mul_div(locker.net_minted, params.liquidation_ratio, 1, "max_buyable")?,
            math::mul_div(value_btc, 10_000, 1, "max_buyable")?,
            "max_buyable",
        )?;
        let v_btc = math::mul_div(shortfall, 10_000, den - 100_000_000, "max_buyable")?;

        let oracle = self.oracle.read().clone();
        let native = oracle.equivalent_output_amount(
            v_btc,
            WRAPPED_DECIMALS,
            NATIVE_DECIMALS,
            Asset::WrappedBtc,
            Asset::Native,
        )?;
        Ok(native.min(locker.native_locked))
    }

    /// Wrapped-BTC price of `collateral_amount` at the discounted rate.
    pub fn discounted_price_of(&self, collateral_amount: u128) -> Result<u128> {
        let discount = self.params.read().price_with_discount_ratio;
        let oracle = self.oracle.read().clone();
        let fair = oracle.equivalent_output_amount(
            collateral_amount,
            NATIVE_DECIMALS,
            WRAPPED_DECIMALS,
            Asset::Native,
            Asset::WrappedBtc,
        )?;
        math::mul_div(fair, discount, MAX_PRICE_DISCOUNT, "discounted_price").map_err(Into::into)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Grant the registry-minter role (the transfer-in router).
    pub fn add_minter(&self, caller: Address, account: Address) -> Result<()> {
        self.ownable.only(caller)?;
        if account.is_zero() {
            return Err(satbridge_core::error::CoreError::ZeroAddress.into());
        }
        if !self.minters.write().insert(account) {
            return Err(LockerError::RoleChangeRejected { account });
        }
        Ok(())
    }

    /// Revoke the registry-minter role.
    pub fn remove_minter(&self, caller: Address, account: Address) -> Result<()> {
        self.ownable.only(caller)?;
        if !self.minters.write().remove(&account) {
            return Err(LockerError::RoleChangeRejected { account });
        }
        Ok(())
    }

    /// Grant the registry-burner role (the burn router).
    pub fn add_burner(&self, caller: Address, account: Address) -> Result<()> {
        self.ownable.only(caller)?;
        if account.is_zero() {
            return Err(satbridge_core::error::CoreError::ZeroAddress.into());
        }
        if !self.burners.write().insert(account) {
            return Err(LockerError::RoleChangeRejected { account });
        }
        Ok(())
    }

    /// Revoke the registry-burner role.
    pub fn remove_burner(&self, caller: Address, account: Address) -> Result<()> {
        self.ownable.only(caller)?;
        if !self.burners.write().remove(&account) {
            return Err(LockerError::RoleChangeRejected { account });
        }
        Ok(())
    }

    /// Install the burn router: its component address (authorized to slash)
    /// and the routing handle used by liquidation.
    pub fn set_burn_router(
        &self,
        caller: Address,
        router_address: Address,
        handle: Arc<dyn BurnRouting>,
    ) -> Result<()> {
        self.ownable.only(caller)?;
        if router_address.is_zero() {
            return Err(satbridge_core::error::CoreError::ZeroAddress.into());
        }
        *self.router.write() = Some((router_address, handle));
        Ok(())
    }

    /// Replace the price oracle.
    pub fn set_price_oracle(&self, caller: Address, oracle: Arc<dyn PriceOracle>) -> Result<()> {
        self.ownable.only(caller)?;
        *self.oracle.write() = oracle;
        Ok(())
    }

    /// Replace the wrapped-BTC ledger handle.
    pub fn set_ledger(&self, caller: Address, ledger: Arc<WrappedLedger>) -> Result<()> {
        self.ownable.only(caller)?;
        *self.ledger.write() = ledger;
        Ok(())
    }

    /// Set the collateral ratio; must stay above the liquidation ratio.
    pub fn set_collateral_ratio(&self, caller: Address, ratio: u128) -> Result<()> {
        self.ownable.only(caller)?;
        let mut params = self.params.write();
        if ratio <= params.liquidation_ratio {
            return Err(LockerError::RatioOutOfRange {
                what: "collateral_ratio",
                value: ratio,
            });
        }
        params.collateral_ratio = ratio;
        Ok(())
    }

    /// Set the liquidation ratio; must stay below the collateral ratio.
    pub fn set_liquidation_ratio(&self, caller: Address, ratio: u128) -> Result<()> {
        self.ownable.only(caller)?;
        let mut params = self.params.write();
        if ratio == 0 || ratio >= params.collateral_ratio {
            return Err(LockerError::RatioOutOfRange {
                what: "liquidation_ratio",
                value: ratio,
            });
        }
        params.liquidation_ratio = ratio;
        Ok(())
    }

    /// Set the locker fee.
    pub fn set_locker_percentage_fee(&self, caller: Address, fee: u128) -> Result<()> {
        self.ownable.only(caller)?;
        if fee > MAX_LOCKER_FEE {
            return Err(LockerError::RatioOutOfRange {
                what: "locker_percentage_fee",
                value: fee,
            });
        }
        self.params.write().locker_percentage_fee = fee;
        Ok(())
    }

    /// Set the slashed-collateral price discount.
    pub fn set_price_with_discount_ratio(&self, caller: Address, ratio: u128) -> Result<()> {
        self.ownable.only(caller)?;
        if ratio > MAX_PRICE_DISCOUNT {
            return Err(LockerError::RatioOutOfRange {
                what: "price_with_discount_ratio",
                value: ratio,
            });
        }
        self.params.write().price_with_discount_ratio = ratio;
        Ok(())
    }

    /// Set the candidacy collateral floor.
    pub fn set_min_required_locked_amount(&self, caller: Address, min: u128) -> Result<()> {
        self.ownable.only(caller)?;
        if min == 0 {
            return Err(LockerError::RatioOutOfRange {
                what: "min_required_locked_amount",
                value: 0,
            });
        }
        self.params.write().min_required_locked_amount = min;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Locker lifecycle
    // ------------------------------------------------------------------

    /// Lock `native_amount` collateral and enter candidacy.
    pub fn request_to_become_locker(
        &self,
        caller: Address,
        locking_script: LockingScript,
        native_amount: u128,
        rescue_type: ScriptType,
        rescue_script: LockingScript,
    ) -> Result<()> {
        let _token = self.guard.enter()?;

        let min = self.params.read().min_required_locked_amount;
        if native_amount < min {
            return Err(LockerError::CollateralBelowMinimum {
                provided: native_amount,
                min,
            });
        }
        if self.script_index.read().contains_key(&locking_script) {
            return Err(LockerError::ScriptAlreadyRegistered(locking_script));
        }
        if self.lockers.read().contains_key(&caller) {
            return Err(LockerError::AlreadyRegistered { account: caller });
        }

        // The collateral accompanies the request.
        self.native.transfer(caller, self.address, native_amount)?;

        let locker = Locker::candidate(
            locking_script.clone(),
            rescue_type,
            rescue_script,
            native_amount,
        );
        self.script_index
            .write()
            .insert(locking_script.clone(), caller);
        self.lockers.write().insert(caller, locker);

        self.log.emit(BridgeEvent::RequestAddLocker {
            candidate: caller,
            locking_script,
            collateral: native_amount,
        });
        Ok(())
    }

    /// Withdraw a pending candidacy and reclaim the collateral.
    pub fn revoke_request(&self, caller: Address) -> Result<()> {
        let _token = self.guard.enter()?;

        let mut lockers = self.lockers.write();
        let locker = lockers
            .get(&caller)
            .ok_or(LockerError::NotCandidate { account: caller })?;
        if !locker.is_candidate {
            return Err(LockerError::NotCandidate { account: caller });
        }
        let refund = locker.native_locked;
        let script = locker.locking_script.clone();
        lockers.remove(&caller);
        drop(lockers);
        self.script_index.write().remove(&script);

        self.native.transfer(self.address, caller, refund)?;
        self.log
            .emit(BridgeEvent::RevokeAddLockerRequest { candidate: caller });
        Ok(())
    }

    /// Approve a candidate. Owner-gated; Candidate becomes Active.
    pub fn add_locker(&self, caller: Address, target: Address) -> Result<()> {
        self.ownable.only(caller)?;

        let mut lockers = self.lockers.write();
        let locker = lockers
            .get_mut(&target)
            .ok_or(LockerError::NotCandidate { account: target })?;
        if !locker.is_candidate {
            return Err(LockerError::NotCandidate { account: target });
        }
        locker.is_candidate = false;
        locker.is_locker = true;
        let locking_script = locker.locking_script.clone();
        let collateral = locker.native_locked;
        drop(lockers);

        self.log.emit(BridgeEvent::LockerAdded {
            locker: target,
            locking_script,
            collateral,
        });
        Ok(())
    }

    /// Begin inactivation; takes effect after [`INACTIVATION_DELAY`].
    pub fn request_inactivation(&self, caller: Address) -> Result<()> {
        let mut lockers = self.lockers.write();
        let locker = lockers
            .get_mut(&caller)
            .filter(|l| l.is_locker)
            .ok_or(LockerError::LockerNotFound { target: caller })?;
        if locker.inactivation_timestamp != 0 {
            return Err(LockerError::AlreadyInactivated { target: caller });
        }
        let when = self.chain.timestamp() + INACTIVATION_DELAY;
        locker.inactivation_timestamp = when;
        drop(lockers);

        self.log.emit(BridgeEvent::RequestInactivateLocker {
            locker: caller,
            inactivation_timestamp: when,
        });
        Ok(())
    }

    /// Cancel inactivation and return to Active.
    pub fn request_activation(&self, caller: Address) -> Result<()> {
        let mut lockers = self.lockers.write();
        let locker = lockers
            .get_mut(&caller)
            .filter(|l| l.is_locker)
            .ok_or(LockerError::LockerNotFound { target: caller })?;
        locker.inactivation_timestamp = 0;
        drop(lockers);

        self.log.emit(BridgeEvent::ActivateLocker { locker: caller });
        Ok(())
    }

    /// Top up any locker's collateral. Open to anyone.
    pub fn add_collateral(&self, caller: Address, target: Address, amount: u128) -> Result<()> {
        let _token = self.guard.enter()?;
        if amount == 0 {
            return Err(LockerError::ZeroAmount);
        }
        if !self.lockers.read().contains_key(&target) {
            return Err(LockerError::LockerNotFound { target });
        }

        self.native.transfer(caller, self.address, amount)?;
        let mut lockers = self.lockers.write();
        let locker = lockers
            .get_mut(&target)
            .ok_or(LockerError::LockerNotFound { target })?;
        locker.native_locked += amount;
        let total = locker.native_locked;
        drop(lockers);

        self.log.emit(BridgeEvent::CollateralAdded {
            locker: target,
            adder: caller,
            amount,
            total,
        });
        Ok(())
    }

    /// Withdraw surplus collateral. Locker must be inactive, and the
    /// remainder must still cover the outstanding minted amount.
    pub fn remove_collateral(&self, caller: Address, amount: u128) -> Result<()> {
        let _token = self.guard.enter()?;
        if amount == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let now = self.chain.timestamp();
        let (remaining, net_minted) = {
            let lockers = self.lockers.read();
            let locker = lockers
                .get(&caller)
                .filter(|l| l.is_locker)
                .ok_or(LockerError::LockerNotFound { target: caller })?;
            if !locker.is_inactive(now) {
                return Err(LockerError::StillActive { target: caller });
            }
            if amount > locker.native_locked {
                return Err(LockerError::InsufficientCollateral {
                    requested: amount,
                    available: locker.native_locked,
                });
            }
            (locker.native_locked - amount, locker.net_minted)
        };

        if self.capacity_total(remaining)? < net_minted {
            return Err(LockerError::WouldUndercollateralize { net_minted });
        }

        self.native.transfer(self.address, caller, amount)?;
        let mut lockers = self.lockers.write();
        let locker = lockers
            .get_mut(&caller)
            .ok_or(LockerError::LockerNotFound { target: caller })?;
        locker.native_locked -= amount;
        let total = locker.native_locked;
        drop(lockers);

        self.log.emit(BridgeEvent::CollateralRemoved {
            locker: caller,
            amount,
            total,
        });
        Ok(())
    }

    /// Exit the registry. Requires inactivity, zero net minted and no
    /// pending slashed-collateral sale; refunds all collateral.
    pub fn self_remove_locker(&self, caller: Address) -> Result<()> {
        let _token = self.guard.enter()?;

        let now = self.chain.timestamp();
        let (refund, script) = {
            let lockers = self.lockers.read();
            let locker = lockers
                .get(&caller)
                .filter(|l| l.is_locker)
                .ok_or(LockerError::LockerNotFound { target: caller })?;
            if !locker.is_inactive(now) {
                return Err(LockerError::StillActive { target: caller });
            }
            if locker.net_minted != 0 {
                return Err(LockerError::NonzeroNetMinted {
                    net_minted: locker.net_minted,
                });
            }
            if locker.slashing_btc_amount != 0 {
                return Err(LockerError::PendingSlashedSale {
                    pending: locker.slashing_btc_amount,
                });
            }
            (locker.native_locked, locker.locking_script.clone())
        };

        self.native.transfer(self.address, caller, refund)?;
        self.lockers.write().remove(&caller);
        self.script_index.write().remove(&script);

        self.log.emit(BridgeEvent::LockerRemoved { locker: caller });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mint / burn
    // ------------------------------------------------------------------

    /// Mint `amount` against the locker controlling `locking_script`,
    /// splitting it between `receiver` and the locker's fee. Registry-minter
    /// gated (the transfer-in router). Returns the amount sent to the
    /// receiver.
    pub fn mint(
        &self,
        caller: Address,
        locking_script: &LockingScript,
        receiver: Address,
        tx_id: TxId,
        amount: u128,
    ) -> Result<u128> {
        let _token = self.guard.enter()?;
        if !self.minters.read().contains(&caller) {
            return Err(LockerError::NotMinter { caller });
        }
        if amount == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let target = self
            .locker_target_address(locking_script)
            .ok_or_else(|| LockerError::UnknownLockingScript(locking_script.clone()))?;

        let now = self.chain.timestamp();
        let (fee, to_receiver) = {
            let lockers = self.lockers.read();
            let locker = lockers
                .get(&target)
                .ok_or(LockerError::LockerNotFound { target })?;
            if !locker.is_active(now) {
                return Err(LockerError::LockerNotActive { target });
            }

            let capacity = self
                .capacity_total(locker.native_locked)?
                .saturating_sub(locker.net_minted);
            if amount > capacity {
                return Err(LockerError::InsufficientCapacity {
                    requested: amount,
                    available: capacity,
                });
            }

            let fee = math::mul_div(
                amount,
                self.params.read().locker_percentage_fee,
                MAX_LOCKER_FEE,
                "locker_fee",
            )?;
            (fee, amount - fee)
        };

        let ledger = self.ledger.read().clone();
        if to_receiver > 0 {
            ledger.mint(self.address, receiver, to_receiver)?;
        }
        if fee > 0 {
            ledger.mint(self.address, target, fee)?;
        }

        let mut lockers = self.lockers.write();
        if let Some(locker) = lockers.get_mut(&target) {
            locker.net_minted += amount;
        }
        drop(lockers);

        tracing::info!(%target, %tx_id, amount, fee, "minted against locker");
        Ok(to_receiver)
    }

    /// Pull `amount` wrapped BTC from the caller, burn it net of the locker
    /// fee, forward the fee to the locker, and retire that much of the
    /// locker's `net_minted`. Registry-burner gated (the burn router).
    /// Returns the burnt (post-fee) amount.
    ///
    /// Deliberately outside the reentrancy guard: liquidation re-enters it
    /// through the burn router while `liquidate_locker` is on the stack.
    pub fn burn(&self, caller: Address, locking_script: &LockingScript, amount: u128) -> Result<u128> {
        if !self.burners.read().contains(&caller) {
            return Err(LockerError::NotBurner { caller });
        }
        if amount == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let target = self
            .locker_target_address(locking_script)
            .ok_or_else(|| LockerError::UnknownLockingScript(locking_script.clone()))?;

        let fee = math::mul_div(
            amount,
            self.params.read().locker_percentage_fee,
            MAX_LOCKER_FEE,
            "locker_fee",
        )?;
        let after_fee = amount - fee;

        {
            let lockers = self.lockers.read();
            let locker = lockers
                .get(&target)
                .ok_or(LockerError::LockerNotFound { target })?;
            if locker.net_minted < after_fee {
                return Err(LockerError::InsufficientNetMinted {
                    need: after_fee,
                    have: locker.net_minted,
                });
            }
        }

        let ledger = self.ledger.read().clone();
        if fee > 0 && ledger.is_blacklisted(target) {
            return Err(LockerError::Ledger(
                satbridge_ledger::LedgerError::Blacklisted { account: target },
            ));
        }

        ledger.transfer_from(self.address, caller, self.address, amount)?;
        ledger.burn(self.address, after_fee)?;
        if fee > 0 {
            ledger.transfer(self.address, target, fee)?;
        }

        let mut lockers = self.lockers.write();
        if let Some(locker) = lockers.get_mut(&target) {
            locker.net_minted -= after_fee;
        }
        drop(lockers);

        tracing::info!(%target, amount, fee, "burnt against locker");
        Ok(after_fee)
    }

    // ------------------------------------------------------------------
    // Slashing
    // ------------------------------------------------------------------

    /// Slash an idle locker for a missed redemption deadline. Burn-router
    /// only. Pays `user_recipient` and `reward_recipient` in native at the
    /// un-discounted oracle price, clamped to the held collateral; any
    /// uncovered remainder is recorded for the slashed-collateral sale.
    /// Retires `amount_btc` of `net_minted`.
    pub fn slash_idle_locker(
        &self,
        caller: Address,
        target: Address,
        reward_btc: u128,
        reward_recipient: Address,
        amount_btc: u128,
        user_recipient: Address,
    ) -> Result<()> {
        let _token = self.guard.enter()?;
        self.only_burn_router(caller)?;
        if amount_btc == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let total_btc = math::add(amount_btc, reward_btc, "slash_idle")?;
        let oracle = self.oracle.read().clone();
        let needed_native = oracle.equivalent_output_amount(
            total_btc,
            WRAPPED_DECIMALS,
            NATIVE_DECIMALS,
            Asset::WrappedBtc,
            Asset::Native,
        )?;

        let (pay_native, reward_native, user_native) = {
            let mut lockers = self.lockers.write();
            let locker = lockers
                .get_mut(&target)
                .ok_or(LockerError::LockerNotFound { target })?;

            let pay_native = needed_native.min(locker.native_locked);
            if pay_native < needed_native {
                // Slashing favors the user: the uncovered share stays owed.
                let uncovered =
                    math::mul_div(total_btc, needed_native - pay_native, needed_native, "slash_idle")?;
                locker.slashing_btc_amount =
                    math::add(locker.slashing_btc_amount, uncovered, "slash_idle")?;
            }

            let reward_native = if total_btc > 0 {
                math::mul_div(pay_native, reward_btc, total_btc, "slash_idle")?
            } else {
                0
            };
            let user_native = pay_native - reward_native;

            locker.native_locked -= pay_native;
            locker.net_minted = locker.net_minted.saturating_sub(amount_btc);
            (pay_native, reward_native, user_native)
        };

        if reward_native > 0 {
            self.native
                .transfer(self.address, reward_recipient, reward_native)?;
        }
        if user_native > 0 {
            self.native
                .transfer(self.address, user_recipient, user_native)?;
        }

        tracing::warn!(%target, amount_btc, reward_btc, pay_native, "idle locker slashed");
        self.log.emit(BridgeEvent::LockerSlashed {
            locker: target,
            kind: SlashKind::Idle,
            amount_btc,
            reward_recipient,
        });
        Ok(())
    }

    /// Slash a thief locker for a provably unauthorized spend. Burn-router
    /// only. Pays only the slasher reward in native; `amount_btc` is
    /// recorded for collection through the discounted sale. `net_minted` is
    /// untouched: the stolen BTC's wrapped supply stays outstanding until
    /// buyers burn it via [`Self::buy_slashed_collateral_of_locker`].
    pub fn slash_thief_locker(
        &self,
        caller: Address,
        target: Address,
        reward_btc: u128,
        reward_recipient: Address,
        amount_btc: u128,
    ) -> Result<()> {
        let _token = self.guard.enter()?;
        self.only_burn_router(caller)?;
        if amount_btc == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let params = self.params.read().clone();
        let oracle = self.oracle.read().clone();
        let equivalent_native = oracle.equivalent_output_amount(
            amount_btc,
            WRAPPED_DECIMALS,
            NATIVE_DECIMALS,
            Asset::WrappedBtc,
            Asset::Native,
        )?;

        let reward_native = {
            let mut lockers = self.lockers.write();
            let locker = lockers
                .get_mut(&target)
                .ok_or(LockerError::LockerNotFound { target })?;

            let mut reward_native =
                math::mul_div(equivalent_native, reward_btc, amount_btc, "slash_thief")?;
            // Reserve enough collateral that the discounted sale can still
            // recover the stolen value: selling c native returns
            // fair(c) * d / 10^4 wrapped, so covering amount_btc takes the
            // inverse ratio.
            let needed_for_sale = math::mul_div(
                equivalent_native,
                MAX_PRICE_DISCOUNT,
                params.price_with_discount_ratio,
                "slash_thief",
            )?;
            let total_needed = math::add(reward_native, needed_for_sale, "slash_thief")?;
            if total_needed > locker.native_locked && total_needed > 0 {
                reward_native = math::mul_div(
                    locker.native_locked,
                    reward_native,
                    total_needed,
                    "slash_thief",
                )?;
            }

            locker.native_locked -= reward_native;
            locker.slashing_btc_amount =
                math::add(locker.slashing_btc_amount, amount_btc, "slash_thief")?;
            reward_native
        };

        if reward_native > 0 {
            self.native
                .transfer(self.address, reward_recipient, reward_native)?;
        }

        tracing::warn!(%target, amount_btc, reward_btc, reward_native, "thief locker slashed");
        self.log.emit(BridgeEvent::LockerSlashed {
            locker: target,
            kind: SlashKind::Thief,
            amount_btc,
            reward_recipient,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Liquidation and slashed-collateral sale
    // ------------------------------------------------------------------

    /// Buy collateral from an unhealthy locker at the discounted price. The
    /// buyer's wrapped BTC is routed through the burn router against the
    /// locker's rescue script, retiring `net_minted`; the buyer receives the
    /// native collateral. Open to anyone while the locker is unhealthy.
    pub fn liquidate_locker(
        &self,
        caller: Address,
        target: Address,
        collateral_amount: u128,
    ) -> Result<()> {
        let _token = self.guard.enter()?;
        if collateral_amount == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let (rescue_script, rescue_type, locking_script) = {
            let lockers = self.lockers.read();
            let locker = lockers
                .get(&target)
                .filter(|l| l.is_locker)
                .ok_or(LockerError::LockerNotFound { target })?;
            match self.health_of(locker)? {
                Some(hf) if hf < HEALTH_FACTOR => {}
                _ => return Err(LockerError::LockerHealthy { target }),
            }
            (
                locker.rescue_script.clone(),
                locker.rescue_type,
                locker.locking_script.clone(),
            )
        };

        let max = self.maximum_buyable_collateral(target)?;
        if collateral_amount > max {
            return Err(LockerError::ExceedsMaxBuyable {
                requested: collateral_amount,
                max,
            });
        }

        let needed_btc = self.discounted_price_of(collateral_amount)?;
        if needed_btc == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let (router_address, router) = self
            .router
            .read()
            .clone()
            .ok_or(LockerError::RouterNotConfigured)?;

        // Pull the buyer's wrapped BTC, then push it through the burn router
        // against the locker's rescue script. A routing failure refunds the
        // buyer before surfacing.
        let ledger = self.ledger.read().clone();
        ledger.transfer_from(self.address, caller, self.address, needed_btc)?;
        ledger.approve(self.address, router_address, needed_btc)?;
        if let Err(e) = router.route_burn(
            self.address,
            needed_btc,
            &rescue_script,
            rescue_type,
            &locking_script,
        ) {
            ledger.approve(self.address, router_address, 0)?;
            ledger.transfer(self.address, caller, needed_btc)?;
            return Err(e.into());
        }

        self.native.transfer(self.address, caller, collateral_amount)?;
        let mut lockers = self.lockers.write();
        if let Some(locker) = lockers.get_mut(&target) {
            locker.native_locked -= collateral_amount;
        }
        drop(lockers);

        self.log.emit(BridgeEvent::LockerLiquidated {
            locker: target,
            buyer: caller,
            collateral_amount,
            paid_amount: needed_btc,
        });
        Ok(())
    }

    /// Buy previously slashed collateral at the discounted price. The
    /// buyer's wrapped BTC is burnt directly (no routing) and the pending
    /// slashed amount decreases. Open to anyone while a sale is pending.
    pub fn buy_slashed_collateral_of_locker(
        &self,
        caller: Address,
        target: Address,
        collateral_amount: u128,
    ) -> Result<()> {
        let _token = self.guard.enter()?;
        if collateral_amount == 0 {
            return Err(LockerError::ZeroAmount);
        }

        let needed_btc = self.discounted_price_of(collateral_amount)?;
        {
            let lockers = self.lockers.read();
            let locker = lockers
                .get(&target)
                .ok_or(LockerError::LockerNotFound { target })?;
            if locker.slashing_btc_amount == 0 {
                return Err(LockerError::NoSlashedCollateral { target });
            }
            if needed_btc == 0 {
                return Err(LockerError::ZeroAmount);
            }
            if needed_btc > locker.slashing_btc_amount {
                return Err(LockerError::ExceedsSlashedAmount {
                    requested: needed_btc,
                    available: locker.slashing_btc_amount,
                });
            }
            if collateral_amount > locker.native_locked {
                return Err(LockerError::InsufficientCollateral {
                    requested: collateral_amount,
                    available: locker.native_locked,
                });
            }
        }

        let ledger = self.ledger.read().clone();
        ledger.transfer_from(self.address, caller, self.address, needed_btc)?;
        ledger.burn(self.address, needed_btc)?;

        self.native.transfer(self.address, caller, collateral_amount)?;
        let mut lockers = self.lockers.write();
        if let Some(locker) = lockers.get_mut(&target) {
            locker.slashing_btc_amount -= needed_btc;
            locker.native_locked -= collateral_amount;
        }
        drop(lockers);

        self.log.emit(BridgeEvent::LockerSlashedCollateralSold {
            locker: target,
            buyer: caller,
            collateral_amount,
            paid_amount: needed_btc,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn only_burn_router(&self, caller: Address) -> Result<()> {
        match self.router.read().as_ref() {
            Some((addr, _)) if *addr == caller => Ok(()),
            _ => Err(LockerError::NotBurnRouter { caller }),
        }
    }

    fn collateral_value_btc(&self, native_locked: u128) -> Result<u128> {
        let oracle = self.oracle.read().clone();
        Ok(oracle.equivalent_output_amount(
            native_locked,
            NATIVE_DECIMALS,
            WRAPPED_DECIMALS,
            Asset::Native,
            Asset::WrappedBtc,
        )?)
    }

    /// Total mintable amount against `native_locked` at the collateral ratio.
    fn capacity_total(&self, native_locked: u128) -> Result<u128> {
        let value_btc = self.collateral_value_btc(native_locked)?;
        math::mul_div(
            value_btc,
            10_000,
            self.params.read().collateral_ratio,
            "capacity",
        )
        .map_err(Into::into)
    }

    fn health_of(&self, locker: &Locker) -> Result<Option<u128>> {
        if locker.net_minted == 0 {
            return Ok(None);
        }
        let value_btc = self.collateral_value_btc(locker.native_locked)?;
        let numerator = value_btc
            .checked_mul(10_000)
            .and_then(|v| v.checked_mul(UPPER_HEALTH_FACTOR))
            .ok_or(satbridge_core::error::CoreError::Overflow("health_factor"))?;
        let denominator = locker
            .net_minted
            .checked_mul(self.params.read().liquidation_ratio)
            .ok_or(satbridge_core::error::CoreError::Overflow("health_factor"))?;
        Ok(Some(numerator / denominator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satbridge_core::chain::ManualChain;
    use satbridge_core::INACTIVATION_DELAY;
    use satbridge_ledger::{LedgerConfig, Role};

    use crate::oracle::FixedPriceOracle;

    const OWNER: Address = Address([0x01; 20]);
    const REGISTRY_ADDR: Address = Address([0xa1; 20]);
    const ROUTER_ADDR: Address = Address([0xa2; 20]);
    const MINTER: Address = Address([0x05; 20]);
    const LOCKER_1: Address = Address([0x11; 20]);
    const USER: Address = Address([0x21; 20]);
    const BUYER: Address = Address([0x22; 20]);

    const ONE_NATIVE: u128 = 1_000_000_000_000_000_000;
    /// 1 native token = 0.05 BTC.
    const PRICE: u128 = 5_000_000;

    struct Harness {
        chain: Arc<ManualChain>,
        log: Arc<EventLog>,
        native: Arc<Accounts>,
        ledger: Arc<WrappedLedger>,
        oracle: Arc<FixedPriceOracle>,
        registry: Arc<LockerRegistry>,
    }

    fn setup() -> Harness {
        let chain = Arc::new(ManualChain::at(0, 1_000_000));
        let log = Arc::new(EventLog::new());
        let native = Arc::new(Accounts::new());
        let ledger = Arc::new(
            WrappedLedger::new(
                OWNER,
                LedgerConfig::default()
                    .with_epoch_length(1_000)
                    .with_max_mint_limit(1_000_000_000_000),
                chain.clone(),
                log.clone(),
            )
            .unwrap(),
        );
        ledger.add_role(OWNER, REGISTRY_ADDR, Role::Minter).unwrap();
        ledger.add_role(OWNER, REGISTRY_ADDR, Role::Burner).unwrap();

        let oracle = Arc::new(FixedPriceOracle::new(PRICE));
        let registry = Arc::new(
            LockerRegistry::new(
                REGISTRY_ADDR,
                OWNER,
                LockerParams::default().with_min_locked(10 * ONE_NATIVE),
                chain.clone(),
                log.clone(),
                native.clone(),
                ledger.clone(),
                oracle.clone(),
            )
            .unwrap(),
        );
        registry.add_minter(OWNER, MINTER).unwrap();
        registry.add_burner(OWNER, ROUTER_ADDR).unwrap();

        native.deposit(LOCKER_1, 10_000 * ONE_NATIVE);
        Harness {
            chain,
            log,
            native,
            ledger,
            oracle,
            registry,
        }
    }

    fn script() -> LockingScript {
        LockingScript::new(vec![0x00, 0x14, 0x42])
    }

    fn rescue() -> LockingScript {
        LockingScript::new(vec![0xbb; 20])
    }

    fn approve_locker(h: &Harness, collateral: u128) {
        h.registry
            .request_to_become_locker(
                LOCKER_1,
                script(),
                collateral,
                ScriptType::P2pkh,
                rescue(),
            )
            .unwrap();
        h.registry.add_locker(OWNER, LOCKER_1).unwrap();
    }

    /// Burn router standing in for the real one: pulls the wrapped BTC and
    /// retires it through `LockerRegistry::burn`.
    struct StubRouter {
        registry: Arc<LockerRegistry>,
        ledger: Arc<WrappedLedger>,
    }

    impl BurnRouting for StubRouter {
        fn route_burn(
            &self,
            caller: Address,
            amount: u128,
            _user_script: &LockingScript,
            _script_type: ScriptType,
            locker_script: &LockingScript,
        ) -> std::result::Result<u128, RoutingError> {
            self.ledger
                .transfer_from(ROUTER_ADDR, caller, ROUTER_ADDR, amount)
                .map_err(|e| RoutingError(e.to_string()))?;
            self.ledger
                .approve(ROUTER_ADDR, self.registry.address(), amount)
                .map_err(|e| RoutingError(e.to_string()))?;
            self.registry
                .burn(ROUTER_ADDR, locker_script, amount)
                .map_err(|e| RoutingError(e.to_string()))
        }
    }

    fn install_router(h: &Harness) {
        let stub = Arc::new(StubRouter {
            registry: h.registry.clone(),
            ledger: h.ledger.clone(),
        });
        h.registry
            .set_burn_router(OWNER, ROUTER_ADDR, stub)
            .unwrap();
    }

    #[test]
    fn test_candidacy_and_approval() {
        let h = setup();
        h.registry
            .request_to_become_locker(
                LOCKER_1,
                script(),
                100 * ONE_NATIVE,
                ScriptType::P2pkh,
                rescue(),
            )
            .unwrap();
        assert_eq!(h.native.balance_of(REGISTRY_ADDR), 100 * ONE_NATIVE);
        assert!(h.registry.locker_target_address(&script()).is_none());

        h.registry.add_locker(OWNER, LOCKER_1).unwrap();
        assert_eq!(
            h.registry.locker_target_address(&script()),
            Some(LOCKER_1)
        );
        let locker = h.registry.locker(LOCKER_1).unwrap();
        assert!(locker.is_locker && !locker.is_candidate);
        assert!(h
            .log
            .any(|e| matches!(e, BridgeEvent::LockerAdded { locker: LOCKER_1, .. })));
    }

    #[test]
    fn test_candidacy_rejections() {
        let h = setup();
        // Below minimum.
        assert!(matches!(
            h.registry.request_to_become_locker(
                LOCKER_1,
                script(),
                ONE_NATIVE,
                ScriptType::P2pkh,
                rescue()
            ),
            Err(LockerError::CollateralBelowMinimum { .. })
        ));

        h.registry
            .request_to_become_locker(
                LOCKER_1,
                script(),
                100 * ONE_NATIVE,
                ScriptType::P2pkh,
                rescue(),
            )
            .unwrap();

        // Duplicate script from another account.
        let other = Address([0x12; 20]);
        h.native.deposit(other, 1_000 * ONE_NATIVE);
        assert!(matches!(
            h.registry.request_to_become_locker(
                other,
                script(),
                100 * ONE_NATIVE,
                ScriptType::P2pkh,
                rescue()
            ),
            Err(LockerError::ScriptAlreadyRegistered(_))
        ));

        // Duplicate candidacy from the same account.
        assert!(matches!(
            h.registry.request_to_become_locker(
                LOCKER_1,
                LockingScript::new(vec![0x99]),
                100 * ONE_NATIVE,
                ScriptType::P2pkh,
                rescue()
            ),
            Err(LockerError::AlreadyRegistered { .. })
        ));

        // Approval is owner-gated.
        assert!(h.registry.add_locker(USER, LOCKER_1).is_err());
    }

    #[test]
    fn test_revoke_request_refunds() {
        let h = setup();
        let before = h.native.balance_of(LOCKER_1);
        h.registry
            .request_to_become_locker(
                LOCKER_1,
                script(),
                50 * ONE_NATIVE,
                ScriptType::P2pkh,
                rescue(),
            )
            .unwrap();
        h.registry.revoke_request(LOCKER_1).unwrap();

        assert_eq!(h.native.balance_of(LOCKER_1), before);
        assert!(h.registry.locker(LOCKER_1).is_none());
        // The script is free again.
        h.registry
            .request_to_become_locker(
                LOCKER_1,
                script(),
                50 * ONE_NATIVE,
                ScriptType::P2pkh,
                rescue(),
            )
            .unwrap();
    }

    #[test]
    fn test_mint_splits_fee_and_tracks_net_minted() {
        let h = setup();
        approve_locker(&h, 1_000 * ONE_NATIVE);

        // Collateral value 50 BTC at 200% ratio: capacity 25 BTC.
        assert_eq!(
            h.registry.locker_capacity(LOCKER_1).unwrap(),
            2_500_000_000
        );

        let minted = h
            .registry
            .mint(MINTER, &script(), USER, TxId([0x77; 32]), 1_000_000_000)
            .unwrap();
        // Fee 20 bps.
        assert_eq!(minted, 998_000_000);
        assert_eq!(h.ledger.balance_of(USER), 998_000_000);
        assert_eq!(h.ledger.balance_of(LOCKER_1), 2_000_000);
        assert_eq!(
            h.registry.locker(LOCKER_1).unwrap().net_minted,
            1_000_000_000
        );

        // Over capacity.
        assert!(matches!(
            h.registry
                .mint(MINTER, &script(), USER, TxId([0x78; 32]), 2_000_000_000),
            Err(LockerError::InsufficientCapacity { .. })
        ));

        // Minter-gated.
        assert!(matches!(
            h.registry
                .mint(USER, &script(), USER, TxId([0x79; 32]), 1),
            Err(LockerError::NotMinter { .. })
        ));
    }

    #[test]
    fn test_mint_requires_active_locker() {
        let h = setup();
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry.request_inactivation(LOCKER_1).unwrap();

        // Still active until the delay elapses.
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x01; 32]), 1_000)
            .unwrap();

        h.chain.advance_time(INACTIVATION_DELAY);
        assert!(matches!(
            h.registry
                .mint(MINTER, &script(), USER, TxId([0x02; 32]), 1_000),
            Err(LockerError::LockerNotActive { .. })
        ));

        h.registry.request_activation(LOCKER_1).unwrap();
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x03; 32]), 1_000)
            .unwrap();
    }

    #[test]
    fn test_burn_retires_net_minted() {
        let h = setup();
        approve_locker(&h, 1_000 * ONE_NATIVE);
        // Mint straight to the router stand-in, as if users had burnt there.
        h.registry
            .mint(MINTER, &script(), ROUTER_ADDR, TxId([0x01; 32]), 1_000_000_000)
            .unwrap();
        let minted_to_router = h.ledger.balance_of(ROUTER_ADDR);

        h.ledger
            .approve(ROUTER_ADDR, REGISTRY_ADDR, 500_000_000)
            .unwrap();
        let after_fee = h
            .registry
            .burn(ROUTER_ADDR, &script(), 500_000_000)
            .unwrap();
        // 20 bps fee forwarded to the locker, the rest burnt.
        assert_eq!(after_fee, 499_000_000);
        assert_eq!(
            h.registry.locker(LOCKER_1).unwrap().net_minted,
            1_000_000_000 - 499_000_000
        );
        assert_eq!(
            h.ledger.balance_of(ROUTER_ADDR),
            minted_to_router - 500_000_000
        );

        // Burner-gated.
        assert!(matches!(
            h.registry.burn(USER, &script(), 1),
            Err(LockerError::NotBurner { .. })
        ));
    }

    #[test]
    fn test_burn_rejects_exceeding_net_minted() {
        let h = setup();
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .mint(MINTER, &script(), ROUTER_ADDR, TxId([0x01; 32]), 1_000)
            .unwrap();
        h.ledger
            .approve(ROUTER_ADDR, REGISTRY_ADDR, u128::MAX)
            .unwrap();
        assert!(matches!(
            h.registry.burn(ROUTER_ADDR, &script(), 100_000),
            Err(LockerError::InsufficientNetMinted { .. })
        ));
    }

    #[test]
    fn test_remove_collateral_keeps_position_covered() {
        let h = setup();
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x01; 32]), 1_000_000_000)
            .unwrap();

        // Active lockers cannot withdraw.
        assert!(matches!(
            h.registry.remove_collateral(LOCKER_1, ONE_NATIVE),
            Err(LockerError::StillActive { .. })
        ));

        h.registry.request_inactivation(LOCKER_1).unwrap();
        h.chain.advance_time(INACTIVATION_DELAY);

        // Net minted 10 BTC at 200% needs 20 BTC of collateral = 400 native.
        // Withdrawing 700 would leave 300: rejected.
        assert!(matches!(
            h.registry.remove_collateral(LOCKER_1, 700 * ONE_NATIVE),
            Err(LockerError::WouldUndercollateralize { .. })
        ));

        h.registry
            .remove_collateral(LOCKER_1, 600 * ONE_NATIVE)
            .unwrap();
        assert_eq!(
            h.registry.locker(LOCKER_1).unwrap().native_locked,
            400 * ONE_NATIVE
        );
    }

    #[test]
    fn test_self_remove_locker() {
        let h = setup();
        approve_locker(&h, 100 * ONE_NATIVE);
        h.registry.request_inactivation(LOCKER_1).unwrap();
        h.chain.advance_time(INACTIVATION_DELAY);

        let before = h.native.balance_of(LOCKER_1);
        h.registry.self_remove_locker(LOCKER_1).unwrap();
        assert_eq!(h.native.balance_of(LOCKER_1), before + 100 * ONE_NATIVE);
        assert!(h.registry.locker(LOCKER_1).is_none());
        assert!(h.registry.locker_target_address(&script()).is_none());
        assert!(h
            .log
            .any(|e| matches!(e, BridgeEvent::LockerRemoved { locker: LOCKER_1 })));
    }

    #[test]
    fn test_slash_idle_pays_user_and_slasher() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x01; 32]), 1_000_000_000)
            .unwrap();

        // 5 BTC owed to the user, 0.5 BTC slasher reward.
        h.registry
            .slash_idle_locker(
                ROUTER_ADDR,
                LOCKER_1,
                50_000_000,
                BUYER,
                500_000_000,
                USER,
            )
            .unwrap();

        // 5.5 BTC at 0.05 BTC/native = 110 native, split 100/10.
        assert_eq!(h.native.balance_of(USER), 100 * ONE_NATIVE);
        assert_eq!(h.native.balance_of(BUYER), 10 * ONE_NATIVE);
        let locker = h.registry.locker(LOCKER_1).unwrap();
        assert_eq!(locker.native_locked, 890 * ONE_NATIVE);
        assert_eq!(locker.net_minted, 500_000_000);
        assert_eq!(locker.slashing_btc_amount, 0);

        // Not callable by anyone but the router.
        assert!(matches!(
            h.registry
                .slash_idle_locker(USER, LOCKER_1, 0, BUYER, 1, USER),
            Err(LockerError::NotBurnRouter { .. })
        ));
    }

    #[test]
    fn test_slash_idle_records_shortfall() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);

        // 60 BTC owed but collateral is worth 50 BTC: 1200 native needed,
        // 1000 available, 10 BTC uncovered.
        h.registry
            .slash_idle_locker(
                ROUTER_ADDR,
                LOCKER_1,
                0,
                BUYER,
                6_000_000_000,
                USER,
            )
            .unwrap();

        let locker = h.registry.locker(LOCKER_1).unwrap();
        assert_eq!(locker.native_locked, 0);
        assert_eq!(h.native.balance_of(USER), 1_000 * ONE_NATIVE);
        assert_eq!(locker.slashing_btc_amount, 1_000_000_000);
    }

    #[test]
    fn test_slash_thief_keeps_net_minted() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x01; 32]), 1_000_000_000)
            .unwrap();

        // 10 BTC stolen, 1 BTC reward.
        h.registry
            .slash_thief_locker(ROUTER_ADDR, LOCKER_1, 100_000_000, BUYER, 1_000_000_000)
            .unwrap();

        let locker = h.registry.locker(LOCKER_1).unwrap();
        // Only the reward (20 native) left the collateral.
        assert_eq!(h.native.balance_of(BUYER), 20 * ONE_NATIVE);
        assert_eq!(locker.native_locked, 980 * ONE_NATIVE);
        assert_eq!(locker.slashing_btc_amount, 1_000_000_000);
        // Unchanged: the stolen BTC's wrapped supply is still outstanding.
        assert_eq!(locker.net_minted, 1_000_000_000);
        assert!(h.log.any(|e| matches!(
            e,
            BridgeEvent::LockerSlashed {
                kind: SlashKind::Thief,
                ..
            }
        )));
    }

    #[test]
    fn test_slash_thief_clamps_reward_to_collateral() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 27 * ONE_NATIVE);
        h.registry
            .set_price_with_discount_ratio(OWNER, 8_000)
            .unwrap();

        // 2 BTC stolen, 0.2 BTC reward. At 0.05 BTC/native the reward is
        // worth 4 native and the sale reserve 50 native; together they
        // exceed the 27 native held, so the reward is scaled pro-rata:
        // 27 * 4 / 54 = 2 native.
        h.registry
            .slash_thief_locker(ROUTER_ADDR, LOCKER_1, 20_000_000, BUYER, 200_000_000)
            .unwrap();

        let locker = h.registry.locker(LOCKER_1).unwrap();
        assert_eq!(h.native.balance_of(BUYER), 2 * ONE_NATIVE);
        assert_eq!(locker.native_locked, 25 * ONE_NATIVE);
        assert_eq!(locker.slashing_btc_amount, 200_000_000);
        assert_eq!(locker.net_minted, 0);
    }

    #[test]
    fn test_buy_slashed_collateral_drains_obligation() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .slash_thief_locker(ROUTER_ADDR, LOCKER_1, 0, BUYER, 1_000_000_000)
            .unwrap();

        // Fund the buyer with wrapped BTC outside the locker path.
        h.ledger.add_role(OWNER, OWNER, Role::Minter).unwrap();
        h.ledger.mint(OWNER, BUYER, 1_000_000_000).unwrap();
        h.ledger
            .approve(BUYER, REGISTRY_ADDR, 1_000_000_000)
            .unwrap();

        let supply_before = h.ledger.total_supply();
        // 100 native at 0.05 BTC less 5% discount = 4.75 BTC.
        h.registry
            .buy_slashed_collateral_of_locker(BUYER, LOCKER_1, 100 * ONE_NATIVE)
            .unwrap();

        let locker = h.registry.locker(LOCKER_1).unwrap();
        assert_eq!(locker.slashing_btc_amount, 1_000_000_000 - 475_000_000);
        assert_eq!(h.native.balance_of(BUYER), 100 * ONE_NATIVE);
        // The buyer's wrapped BTC was burnt, not redistributed.
        assert_eq!(h.ledger.total_supply(), supply_before - 475_000_000);
        assert_eq!(h.ledger.balance_of(BUYER), 1_000_000_000 - 475_000_000);
    }

    #[test]
    fn test_buy_slashed_collateral_bounds() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);

        // Nothing slashed yet.
        assert!(matches!(
            h.registry
                .buy_slashed_collateral_of_locker(BUYER, LOCKER_1, ONE_NATIVE),
            Err(LockerError::NoSlashedCollateral { .. })
        ));

        h.registry
            .slash_thief_locker(ROUTER_ADDR, LOCKER_1, 0, BUYER, 100_000_000)
            .unwrap();

        // A purchase worth more than the pending amount is rejected.
        assert!(matches!(
            h.registry
                .buy_slashed_collateral_of_locker(BUYER, LOCKER_1, 500 * ONE_NATIVE),
            Err(LockerError::ExceedsSlashedAmount { .. })
        ));
    }

    #[test]
    fn test_liquidation_requires_unhealthy() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x01; 32]), 1_000_000_000)
            .unwrap();

        assert!(!h.registry.is_liquidatable(LOCKER_1).unwrap());
        assert_eq!(h.registry.maximum_buyable_collateral(LOCKER_1).unwrap(), 0);
        assert!(matches!(
            h.registry.liquidate_locker(BUYER, LOCKER_1, ONE_NATIVE),
            Err(LockerError::LockerHealthy { .. })
        ));
    }

    #[test]
    fn test_liquidation_buys_collateral_and_retires_debt() {
        let h = setup();
        install_router(&h);
        approve_locker(&h, 1_000 * ONE_NATIVE);
        h.registry
            .mint(MINTER, &script(), USER, TxId([0x01; 32]), 1_000_000_000)
            .unwrap();

        // Price collapse: 1 native now 0.013 BTC; health 8666 < 10_000.
        h.oracle.set_price(1_300_000);
        assert!(h.registry.is_liquidatable(LOCKER_1).unwrap());

        let max = h.registry.maximum_buyable_collateral(LOCKER_1).unwrap();
        assert!(max > 300 * ONE_NATIVE && max < 400 * ONE_NATIVE);

        // Above the bound.
        assert!(matches!(
            h.registry.liquidate_locker(BUYER, LOCKER_1, max + ONE_NATIVE),
            Err(LockerError::ExceedsMaxBuyable { .. })
        ));

        // Fund the buyer and liquidate 200 native.
        h.ledger.add_role(OWNER, OWNER, Role::Minter).unwrap();
        h.ledger.mint(OWNER, BUYER, 1_000_000_000).unwrap();
        h.ledger
            .approve(BUYER, REGISTRY_ADDR, 1_000_000_000)
            .unwrap();

        // 200 native * 0.013 BTC * 95% = 2.47 BTC.
        let needed_btc = 247_000_000;
        assert_eq!(
            h.registry.discounted_price_of(200 * ONE_NATIVE).unwrap(),
            needed_btc
        );

        h.registry
            .liquidate_locker(BUYER, LOCKER_1, 200 * ONE_NATIVE)
            .unwrap();

        let locker = h.registry.locker(LOCKER_1).unwrap();
        assert_eq!(locker.native_locked, 800 * ONE_NATIVE);
        assert_eq!(h.native.balance_of(BUYER), 200 * ONE_NATIVE);

        // The routed burn retired needed_btc net of the 20 bps locker fee.
        let fee = needed_btc * 20 / 10_000;
        assert_eq!(
            locker.net_minted,
            1_000_000_000 - (needed_btc - fee)
        );
        assert!(h
            .log
            .any(|e| matches!(e, BridgeEvent::LockerLiquidated { .. })));
    }

    #[test]
    fn test_ratio_setters_keep_invariant() {
        let h = setup();
        // collateral_ratio must stay above liquidation_ratio.
        assert!(matches!(
            h.registry.set_collateral_ratio(OWNER, 15_000),
            Err(LockerError::RatioOutOfRange { .. })
        ));
        assert!(matches!(
            h.registry.set_liquidation_ratio(OWNER, 20_000),
            Err(LockerError::RatioOutOfRange { .. })
        ));
        h.registry.set_liquidation_ratio(OWNER, 12_000).unwrap();
        h.registry.set_collateral_ratio(OWNER, 18_000).unwrap();
        assert!(matches!(
            h.registry.set_price_with_discount_ratio(OWNER, 10_001),
            Err(LockerError::RatioOutOfRange { .. })
        ));
    }
}
