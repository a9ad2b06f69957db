//! The burn router.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use satbridge_bitcoin::ParsedTransaction;
use satbridge_core::events::{BridgeEvent, EventLog};
use satbridge_core::guard::{Ownable, Pausable, ReentrancyGuard};
use satbridge_core::math;
use satbridge_core::types::{Address, LockingScript, ScriptType, TxId};
use satbridge_core::{MAX_PROTOCOL_FEE, MAX_SLASHER_REWARD};
use satbridge_ledger::WrappedLedger;
use satbridge_lockers::{BurnRouting, LockerRegistry, RoutingError};
use satbridge_relay::BtcRelay;

use crate::error::{Result, RouterError};
use crate::request::BurnRequest;

/// Tunable router parameters.
#[derive(Debug, Clone)]
pub struct RouterParams {
    /// Bitcoin blocks a locker has to prove payment. Must exceed the
    /// relay's finalization parameter.
    pub transfer_deadline: u64,
    /// Protocol fee on burns, 10_000 = 100%.
    pub protocol_percentage_fee: u128,
    /// Slasher reward on disputes, 10_000 = 100%.
    pub slasher_percentage_reward: u128,
    /// Flat Bitcoin network fee the locker spends on the payment, in sats.
    pub bitcoin_fee: u128,
    /// Proofs and disputes referencing earlier blocks are rejected.
    pub starting_block_number: u64,
    /// Protocol fee destination.
    pub treasury: Address,
}

impl Default for RouterParams {
    fn default() -> Self {
        Self {
            transfer_deadline: 72,
            protocol_percentage_fee: 50,
            slasher_percentage_reward: 500,
            bitcoin_fee: 10_000,
            starting_block_number: 0,
            treasury: Address::ZERO,
        }
    }
}

impl RouterParams {
    /// Set the transfer deadline.
    pub fn with_transfer_deadline(mut self, blocks: u64) -> Self {
        self.transfer_deadline = blocks;
        self
    }

    /// Set the protocol fee.
    pub fn with_protocol_fee(mut self, fee: u128) -> Self {
        self.protocol_percentage_fee = fee;
        self
    }

    /// Set the slasher reward.
    pub fn with_slasher_reward(mut self, reward: u128) -> Self {
        self.slasher_percentage_reward = reward;
        self
    }

    /// Set the flat Bitcoin fee.
    pub fn with_bitcoin_fee(mut self, fee: u128) -> Self {
        self.bitcoin_fee = fee;
        self
    }

    /// Set the starting block bound.
    pub fn with_starting_block(mut self, block: u64) -> Self {
        self.starting_block_number = block;
        self
    }

    /// Set the treasury address.
    pub fn with_treasury(mut self, treasury: Address) -> Self {
        self.treasury = treasury;
        self
    }
}

/// Router for user redemptions and locker discipline.
pub struct BurnRouter {
    address: Address,
    ownable: Ownable,
    pausable: Pausable,
    guard: ReentrancyGuard,
    log: Arc<EventLog>,
    ledger: RwLock<Arc<WrappedLedger>>,
    registry: RwLock<Arc<LockerRegistry>>,
    relay: RwLock<Arc<dyn BtcRelay>>,
    params: RwLock<RouterParams>,
    bitcoin_fee_oracle: RwLock<Address>,
    requests: RwLock<HashMap<Address, Vec<BurnRequest>>>,
    used_as_burn_proof: RwLock<HashSet<TxId>>,
}

impl std::fmt::Debug for BurnRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BurnRouter")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl BurnRouter {
    /// Create a router at `address`, owned by `owner`. The owner starts as
    /// the Bitcoin fee oracle until a dedicated principal is set.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: Address,
        owner: Address,
        params: RouterParams,
        log: Arc<EventLog>,
        ledger: Arc<WrappedLedger>,
        registry: Arc<LockerRegistry>,
        relay: Arc<dyn BtcRelay>,
    ) -> Result<Self> {
        if address.is_zero() || params.treasury.is_zero() {
            return Err(RouterError::Core(
                satbridge_core::error::CoreError::ZeroAddress,
            ));
        }
        if params.protocol_percentage_fee > MAX_PROTOCOL_FEE {
            return Err(RouterError::FeeOutOfRange {
                what: "protocol_percentage_fee",
                value: params.protocol_percentage_fee,
            });
        }
        let finalization = relay.finalization_parameter();
        if params.transfer_deadline <= finalization {
            return Err(RouterError::TransferDeadlineTooShort {
                deadline: params.transfer_deadline,
                finalization,
            });
        }
        Ok(Self {
            address,
            ownable: Ownable::new(owner)?,
            pausable: Pausable::new(),
            guard: ReentrancyGuard::new(),
            log,
            ledger: RwLock::new(ledger),
            registry: RwLock::new(registry),
            relay: RwLock::new(relay),
            params: RwLock::new(params),
            bitcoin_fee_oracle: RwLock::new(owner),
            requests: RwLock::new(HashMap::new()),
            used_as_burn_proof: RwLock::new(HashSet::new()),
        })
    }

    /// The router's own component address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    /// Current parameters.
    pub fn params(&self) -> RouterParams {
        self.params.read().clone()
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// All burn requests recorded against a locker.
    pub fn burn_requests(&self, locker: Address) -> Vec<BurnRequest> {
        self.requests
            .read()
            .get(&locker)
            .cloned()
            .unwrap_or_default()
    }

    /// A single burn request.
    pub fn burn_request(&self, locker: Address, index: usize) -> Option<BurnRequest> {
        self.requests
            .read()
            .get(&locker)
            .and_then(|reqs| reqs.get(index).cloned())
    }

    /// Whether `tx_id` has been accepted as a burn proof (and is therefore
    /// immune to locker disputes).
    pub fn is_used_as_burn_proof(&self, tx_id: &TxId) -> bool {
        self.used_as_burn_proof.read().contains(tx_id)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Pause the user-facing entry points. Owner-gated.
    pub fn pause(&self, caller: Address) -> Result<()> {
        self.ownable.only(caller)?;
        self.pausable.pause();
        Ok(())
    }

    /// Unpause. Owner-gated.
    pub fn unpause(&self, caller: Address) -> Result<()> {
        self.ownable.only(caller)?;
        self.pausable.unpause();
        Ok(())
    }

    /// Hand ownership to a new address.
    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        Ok(self.ownable.transfer_ownership(caller, new_owner)?)
    }

    /// Replace the relay handle.
    pub fn set_relay(&self, caller: Address, relay: Arc<dyn BtcRelay>) -> Result<()> {
        self.ownable.only(caller)?;
        *self.relay.write() = relay;
        Ok(())
    }

    /// Replace the registry handle.
    pub fn set_lockers(&self, caller: Address, registry: Arc<LockerRegistry>) -> Result<()> {
        self.ownable.only(caller)?;
        *self.registry.write() = registry;
        Ok(())
    }

    /// Replace the ledger handle.
    pub fn set_ledger(&self, caller: Address, ledger: Arc<WrappedLedger>) -> Result<()> {
        self.ownable.only(caller)?;
        *self.ledger.write() = ledger;
        Ok(())
    }

    /// Set the treasury. Owner-gated, zero rejected.
    pub fn set_treasury(&self, caller: Address, treasury: Address) -> Result<()> {
        self.ownable.only(caller)?;
        if treasury.is_zero() {
            return Err(RouterError::Core(
                satbridge_core::error::CoreError::ZeroAddress,
            ));
        }
        self.params.write().treasury = treasury;
        Ok(())
    }

    /// Set the transfer deadline. Owner-gated once the deadline exceeds the
    /// relay's finalization parameter; before that, anyone may call (the
    /// bootstrapping path). The new value must exceed finalization.
    pub fn set_transfer_deadline(&self, caller: Address, deadline: u64) -> Result<()> {
        let finalization = self.relay.read().finalization_parameter();
        if self.params.read().transfer_deadline >= finalization {
            self.ownable.only(caller)?;
        }
        if deadline <= finalization {
            return Err(RouterError::TransferDeadlineTooShort {
                deadline,
                finalization,
            });
        }
        self.params.write().transfer_deadline = deadline;
        Ok(())
    }

    /// Set the protocol fee. Owner-gated, capped at 100%.
    pub fn set_protocol_percentage_fee(&self, caller: Address, fee: u128) -> Result<()> {
        self.ownable.only(caller)?;
        if fee > MAX_PROTOCOL_FEE {
            return Err(RouterError::FeeOutOfRange {
                what: "protocol_percentage_fee",
                value: fee,
            });
        }
        self.params.write().protocol_percentage_fee = fee;
        Ok(())
    }

    /// Set the slasher reward. Owner-gated, capped at 100%.
    pub fn set_slasher_percentage_reward(&self, caller: Address, reward: u128) -> Result<()> {
        self.ownable.only(caller)?;
        if reward > MAX_SLASHER_REWARD {
            return Err(RouterError::FeeOutOfRange {
                what: "slasher_percentage_reward",
                value: reward,
            });
        }
        self.params.write().slasher_percentage_reward = reward;
        Ok(())
    }

    /// Set the Bitcoin fee oracle principal. Owner-gated.
    pub fn set_bitcoin_fee_oracle(&self, caller: Address, oracle: Address) -> Result<()> {
        self.ownable.only(caller)?;
        if oracle.is_zero() {
            return Err(RouterError::Core(
                satbridge_core::error::CoreError::ZeroAddress,
            ));
        }
        *self.bitcoin_fee_oracle.write() = oracle;
        Ok(())
    }

    /// Set the flat Bitcoin fee. Fee-oracle gated (distinct from owner).
    pub fn set_bitcoin_fee(&self, caller: Address, fee: u128) -> Result<()> {
        if caller != *self.bitcoin_fee_oracle.read() {
            return Err(RouterError::NotFeeOracle { caller });
        }
        self.params.write().bitcoin_fee = fee;
        Ok(())
    }

    /// Raise the starting block bound. Owner-gated, strictly increasing.
    pub fn set_starting_block_number(&self, caller: Address, block: u64) -> Result<()> {
        self.ownable.only(caller)?;
        let mut params = self.params.write();
        if block <= params.starting_block_number {
            return Err(RouterError::StartingBlockNotIncreasing {
                current: params.starting_block_number,
                proposed: block,
            });
        }
        params.starting_block_number = block;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Burn lifecycle
    // ------------------------------------------------------------------

    /// Surrender `amount` wrapped BTC for redemption to `user_script` via
    /// the locker controlling `locker_locking_script`. Returns the BTC
    /// amount the locker owes the user.
    pub fn cc_burn(
        &self,
        caller: Address,
        amount: u128,
        user_script: &LockingScript,
        script_type: ScriptType,
        locker_locking_script: &LockingScript,
    ) -> Result<u128> {
        self.pausable.ensure_not_paused().map_err(RouterError::Core)?;
        let _token = self.guard.enter().map_err(RouterError::Core)?;

        let expected = script_type.payload_len();
        if user_script.len() != expected {
            return Err(RouterError::BadUserScript {
                script_type,
                expected,
                got: user_script.len(),
            });
        }

        let registry = self.registry.read().clone();
        let locker = registry
            .locker_target_address(locker_locking_script)
            .ok_or_else(|| RouterError::UnknownLocker(locker_locking_script.clone()))?;

        let params = self.params.read().clone();
        let protocol_fee = math::mul_div(
            amount,
            params.protocol_percentage_fee,
            MAX_PROTOCOL_FEE,
            "protocol_fee",
        )
        .map_err(RouterError::Core)?;

        // Dust floor: the payment must be worth more than the fees it costs.
        let minimum = math::add(
            protocol_fee,
            params.bitcoin_fee.saturating_mul(2),
            "dust_floor",
        )
        .map_err(RouterError::Core)?;
        if amount <= minimum {
            return Err(RouterError::BelowDust { amount, minimum });
        }
        let remaining = amount - protocol_fee;

        let ledger = self.ledger.read().clone();
        if protocol_fee > 0 && ledger.is_blacklisted(params.treasury) {
            return Err(RouterError::Ledger(
                satbridge_ledger::LedgerError::Blacklisted {
                    account: params.treasury,
                },
            ));
        }

        // Pull the full amount, retire `remaining` through the registry,
        // then forward the protocol fee. A registry failure refunds the
        // caller before surfacing.
        ledger.transfer_from(self.address, caller, self.address, amount)?;
        ledger.approve(self.address, registry.address(), remaining)?;
        let after_locker_fee = match registry.burn(self.address, locker_locking_script, remaining) {
            Ok(v) => v,
            Err(e) => {
                ledger.approve(self.address, registry.address(), 0)?;
                ledger.transfer(self.address, caller, amount)?;
                return Err(e.into());
            }
        };
        if protocol_fee > 0 {
            ledger.transfer(self.address, params.treasury, protocol_fee)?;
        }

        // The flat Bitcoin fee comes out of the post-locker-fee value
        // proportionally, keeping the locker's fee share intact.
        let burnt_amount = math::mul_div(
            after_locker_fee,
            remaining - params.bitcoin_fee,
            remaining,
            "burnt_amount",
        )
        .map_err(RouterError::Core)?;

        let deadline = self.relay.read().last_submitted_height() + params.transfer_deadline;
        let mut requests = self.requests.write();
        let list = requests.entry(locker).or_default();
        let request_index = list.len() as u64;
        list.push(BurnRequest {
            amount,
            burnt_amount,
            sender: caller,
            user_script: user_script.clone(),
            script_type,
            deadline,
            is_transferred: false,
            request_id_of_locker: request_index,
        });
        drop(requests);

        self.log.emit(BridgeEvent::CcBurn {
            sender: caller,
            locker,
            user_script: user_script.clone(),
            script_type,
            amount,
            burnt_amount,
            request_index,
            deadline,
        });
        Ok(burnt_amount)
    }

    /// Credit burn requests paid by a finalized Bitcoin transaction.
    ///
    /// `burn_req_indexes[i]` names the request discharged by output
    /// `vout_indexes[i]`. Returns the number of requests credited.
    #[allow(clippy::too_many_arguments)]
    pub fn burn_proof(
        &self,
        caller: Address,
        tx_bytes: &[u8],
        block_number: u64,
        merkle_proof: &[[u8; 32]],
        tx_index: u32,
        locker_locking_script: &LockingScript,
        burn_req_indexes: &[usize],
        vout_indexes: &[usize],
    ) -> Result<usize> {
        self.pausable.ensure_not_paused().map_err(RouterError::Core)?;
        let _token = self.guard.enter().map_err(RouterError::Core)?;

        let starting = self.params.read().starting_block_number;
        if block_number < starting {
            return Err(RouterError::BeforeStartingBlock {
                block: block_number,
                starting,
            });
        }

        let registry = self.registry.read().clone();
        let locker = registry
            .locker_target_address(locker_locking_script)
            .ok_or_else(|| RouterError::UnknownLocker(locker_locking_script.clone()))?;

        let tx = ParsedTransaction::parse(tx_bytes)?;
        if tx.locktime != 0 {
            return Err(RouterError::NonzeroLocktime(tx.locktime));
        }

        if burn_req_indexes.len() != vout_indexes.len() {
            return Err(RouterError::LengthMismatch {
                requests: burn_req_indexes.len(),
                vouts: vout_indexes.len(),
            });
        }
        if vout_indexes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(RouterError::UnsortedVoutIndexes);
        }

        let tx_id = tx.txid();
        if !self
            .relay
            .read()
            .check_tx_proof(&tx_id, block_number, merkle_proof, tx_index)?
        {
            return Err(RouterError::InvalidInclusionProof(tx_id));
        }

        let mut paid = 0usize;
        {
            let mut requests = self.requests.write();
            let list = requests.entry(locker).or_default();
            for (&req_index, &vout_index) in burn_req_indexes.iter().zip(vout_indexes) {
                let len = list.len();
                let request = list
                    .get_mut(req_index)
                    .ok_or(RouterError::RequestOutOfRange {
                        index: req_index,
                        len,
                    })?;
                // Already credited, or paid after its deadline: late
                // payments are not credited, only slashed.
                if request.is_transferred || request.deadline < block_number {
                    continue;
                }
                let value = tx.output_value_matching(
                    vout_index,
                    request.script_type,
                    request.user_script.as_bytes(),
                )?;
                if value.map(u128::from) == Some(request.burnt_amount) {
                    request.is_transferred = true;
                    paid += 1;
                    self.log.emit(BridgeEvent::PaidCcBurn {
                        locker,
                        request_index: req_index as u64,
                        tx_id,
                    });
                }
            }
        }

        // Every output except at most one (the locker's change) paid a
        // request: the transaction is a legitimate spend and becomes immune
        // to locker disputes. A proof crediting nothing immunizes nothing.
        if paid > 0 && paid + 1 >= tx.outputs.len() {
            self.used_as_burn_proof.write().insert(tx_id);
        }

        tracing::info!(%locker, %tx_id, paid, by = %caller, "burn proof processed");
        Ok(paid)
    }

    /// Slash a locker for requests whose deadlines elapsed unpaid.
    /// Owner-gated; the caller collects the slasher reward.
    pub fn dispute_burn(
        &self,
        caller: Address,
        locker_locking_script: &LockingScript,
        indexes: &[usize],
    ) -> Result<()> {
        self.ownable.only(caller)?;
        let _token = self.guard.enter().map_err(RouterError::Core)?;

        let registry = self.registry.read().clone();
        let locker = registry
            .locker_target_address(locker_locking_script)
            .ok_or_else(|| RouterError::UnknownLocker(locker_locking_script.clone()))?;

        let params = self.params.read().clone();
        let tip = self.relay.read().last_submitted_height();

        // Validate each index against live state immediately before its
        // slash: a request already discharged earlier in this very batch
        // (a duplicate index) must not be slashed twice.
        for &index in indexes {
            let (amount, sender) = {
                let requests = self.requests.read();
                let list = requests.get(&locker).map(Vec::as_slice).unwrap_or(&[]);
                let request = list.get(index).ok_or(RouterError::RequestOutOfRange {
                    index,
                    len: list.len(),
                })?;
                if request.deadline < params.starting_block_number {
                    return Err(RouterError::StaleRequest { index });
                }
                if request.is_transferred {
                    return Err(RouterError::AlreadyTransferred { index });
                }
                if request.deadline >= tip {
                    return Err(RouterError::DeadlineNotElapsed {
                        deadline: request.deadline,
                        tip,
                    });
                }
                (request.amount, request.sender)
            };

            let reward = math::mul_div(
                amount,
                params.slasher_percentage_reward,
                MAX_SLASHER_REWARD,
                "slasher_reward",
            )
            .map_err(RouterError::Core)?;

            registry.slash_idle_locker(self.address, locker, reward, caller, amount, sender)?;

            // Discharged by the dispute: prevents double-disputing.
            if let Some(request) = self
                .requests
                .write()
                .get_mut(&locker)
                .and_then(|list| list.get_mut(index))
            {
                request.is_transferred = true;
            }

            self.log.emit(BridgeEvent::BurnDispute {
                locker,
                request_index: index as u64,
                disputer: caller,
            });
        }
        Ok(())
    }

    /// Slash a locker that spent a UTXO which was not a burn payment.
    ///
    /// `input_tx_bytes` is the offending spend, proven final at
    /// `input_block_number`; `output_tx_bytes` is the funding transaction
    /// showing the consumed outpoint was locked to the accused locker.
    /// Owner-gated; the caller collects the slasher reward.
    #[allow(clippy::too_many_arguments)]
    pub fn dispute_locker(
        &self,
        caller: Address,
        locker_locking_script: &LockingScript,
        input_tx_bytes: &[u8],
        output_tx_bytes: &[u8],
        input_merkle_proof: &[[u8; 32]],
        input_index: usize,
        input_tx_index: u32,
        input_block_number: u64,
    ) -> Result<()> {
        self.ownable.only(caller)?;
        let _token = self.guard.enter().map_err(RouterError::Core)?;

        let params = self.params.read().clone();
        if input_block_number < params.starting_block_number {
            return Err(RouterError::BeforeStartingBlock {
                block: input_block_number,
                starting: params.starting_block_number,
            });
        }

        let registry = self.registry.read().clone();
        let locker = registry
            .locker_target_address(locker_locking_script)
            .ok_or_else(|| RouterError::UnknownLocker(locker_locking_script.clone()))?;

        let input_tx = ParsedTransaction::parse(input_tx_bytes)?;
        let input_tx_id = input_tx.txid();

        if !self.relay.read().check_tx_proof(
            &input_tx_id,
            input_block_number,
            input_merkle_proof,
            input_tx_index,
        )? {
            return Err(RouterError::InvalidInclusionProof(input_tx_id));
        }

        if self.used_as_burn_proof.read().contains(&input_tx_id) {
            return Err(RouterError::AlreadyUsedAsBurnProof(input_tx_id));
        }

        // Only stale spends are disputable; an honest locker still inside
        // the transfer window may not have proven its payment yet.
        let tip = self.relay.read().last_submitted_height();
        let allowed_after = input_block_number + params.transfer_deadline;
        if tip <= allowed_after {
            return Err(RouterError::DisputeTooEarly {
                block: input_block_number,
                allowed_after,
            });
        }

        // The consumed outpoint must come from the presented funding tx and
        // must have been locked to the accused locker.
        let (outpoint_tx_id, outpoint_index) = input_tx.outpoint(input_index)?;
        let output_tx = ParsedTransaction::parse(output_tx_bytes)?;
        if outpoint_tx_id != output_tx.txid() {
            return Err(RouterError::OutpointMismatch {
                expected: outpoint_tx_id,
                got: output_tx.txid(),
            });
        }
        if output_tx.locking_script(outpoint_index as usize)? != locker_locking_script.as_bytes() {
            return Err(RouterError::ScriptMismatch);
        }

        let total_value = input_tx.total_output_value();
        let reward = math::mul_div(
            total_value,
            params.slasher_percentage_reward,
            MAX_SLASHER_REWARD,
            "slasher_reward",
        )
        .map_err(RouterError::Core)?;

        registry.slash_thief_locker(self.address, locker, reward, caller, total_value)?;

        tracing::warn!(%locker, %input_tx_id, total_value, "locker dispute succeeded");
        self.log.emit(BridgeEvent::LockerDispute {
            locker,
            tx_id: input_tx_id,
            disputer: caller,
            slashed_amount: total_value,
        });
        Ok(())
    }
}

impl BurnRouting for BurnRouter {
    fn route_burn(
        &self,
        caller: Address,
        amount: u128,
        user_script: &LockingScript,
        script_type: ScriptType,
        locker_script: &LockingScript,
    ) -> std::result::Result<u128, RoutingError> {
        self.cc_burn(caller, amount, user_script, script_type, locker_script)
            .map_err(|e| RoutingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satbridge_core::accounts::Accounts;
    use satbridge_core::chain::ManualChain;
    use satbridge_core::error::CoreError;
    use satbridge_ledger::LedgerConfig;
    use satbridge_lockers::{FixedPriceOracle, LockerParams};
    use satbridge_relay::MemoryRelay;

    const OWNER: Address = Address([0x01; 20]);
    const TREASURY: Address = Address([0x02; 20]);
    const STRANGER: Address = Address([0x03; 20]);
    const FEE_ORACLE: Address = Address([0x04; 20]);

    fn build_router(relay: Arc<MemoryRelay>) -> BurnRouter {
        let chain = Arc::new(ManualChain::at(0, 0));
        let log = Arc::new(EventLog::new());
        let ledger = Arc::new(
            WrappedLedger::new(OWNER, LedgerConfig::default(), chain.clone(), log.clone()).unwrap(),
        );
        let registry = Arc::new(
            LockerRegistry::new(
                Address([0xa1; 20]),
                OWNER,
                LockerParams::default(),
                chain,
                log.clone(),
                Arc::new(Accounts::new()),
                ledger.clone(),
                Arc::new(FixedPriceOracle::new(1)),
            )
            .unwrap(),
        );
        BurnRouter::new(
            Address([0xa2; 20]),
            OWNER,
            RouterParams::default()
                .with_transfer_deadline(10)
                .with_treasury(TREASURY),
            log,
            ledger,
            registry,
            relay,
        )
        .unwrap()
    }

    #[test]
    fn test_constructor_rejects_short_deadline() {
        let relay = Arc::new(MemoryRelay::new(0, 20));
        let chain = Arc::new(ManualChain::at(0, 0));
        let log = Arc::new(EventLog::new());
        let ledger = Arc::new(
            WrappedLedger::new(OWNER, LedgerConfig::default(), chain.clone(), log.clone()).unwrap(),
        );
        let registry = Arc::new(
            LockerRegistry::new(
                Address([0xa1; 20]),
                OWNER,
                LockerParams::default(),
                chain,
                log.clone(),
                Arc::new(Accounts::new()),
                ledger.clone(),
                Arc::new(FixedPriceOracle::new(1)),
            )
            .unwrap(),
        );
        let err = BurnRouter::new(
            Address([0xa2; 20]),
            OWNER,
            RouterParams::default()
                .with_transfer_deadline(10)
                .with_treasury(TREASURY),
            log,
            ledger,
            registry,
            relay,
        )
        .unwrap_err();
        assert!(matches!(err, RouterError::TransferDeadlineTooShort { .. }));
    }

    #[test]
    fn test_bitcoin_fee_oracle_gate() {
        let router = build_router(Arc::new(MemoryRelay::new(0, 3)));

        // The owner starts as fee oracle.
        router.set_bitcoin_fee(OWNER, 2_000).unwrap();
        assert_eq!(router.params().bitcoin_fee, 2_000);

        router.set_bitcoin_fee_oracle(OWNER, FEE_ORACLE).unwrap();
        // The owner no longer qualifies; the dedicated principal does.
        assert!(matches!(
            router.set_bitcoin_fee(OWNER, 3_000),
            Err(RouterError::NotFeeOracle { .. })
        ));
        router.set_bitcoin_fee(FEE_ORACLE, 3_000).unwrap();
        assert_eq!(router.params().bitcoin_fee, 3_000);
    }

    #[test]
    fn test_transfer_deadline_bootstrap_quirk() {
        let router = build_router(Arc::new(MemoryRelay::new(0, 3)));

        // Normal regime: deadline (10) >= finalization (3), owner only.
        assert!(matches!(
            router.set_transfer_deadline(STRANGER, 50),
            Err(RouterError::Core(CoreError::NotOwner { .. }))
        ));
        router.set_transfer_deadline(OWNER, 50).unwrap();

        // Swap in a relay whose finalization exceeds the current deadline:
        // the bootstrap condition opens the setter to anyone.
        router
            .set_relay(OWNER, Arc::new(MemoryRelay::new(0, 100)))
            .unwrap();
        router.set_transfer_deadline(STRANGER, 150).unwrap();
        assert_eq!(router.params().transfer_deadline, 150);

        // And the new value must still exceed finalization.
        assert!(matches!(
            router.set_transfer_deadline(OWNER, 100),
            Err(RouterError::TransferDeadlineTooShort { .. })
        ));
    }

    #[test]
    fn test_starting_block_strictly_increases() {
        let router = build_router(Arc::new(MemoryRelay::new(0, 3)));
        router.set_starting_block_number(OWNER, 5).unwrap();
        assert!(matches!(
            router.set_starting_block_number(OWNER, 5),
            Err(RouterError::StartingBlockNotIncreasing { .. })
        ));
        router.set_starting_block_number(OWNER, 6).unwrap();
    }

    #[test]
    fn test_pause_blocks_user_entry_points() {
        let router = build_router(Arc::new(MemoryRelay::new(0, 3)));
        router.pause(OWNER).unwrap();

        let err = router
            .cc_burn(
                STRANGER,
                1_000_000,
                &LockingScript::new(vec![0xaa; 20]),
                ScriptType::P2wpkh,
                &LockingScript::new(vec![0x00]),
            )
            .unwrap_err();
        assert!(matches!(err, RouterError::Core(CoreError::Paused)));

        router.unpause(OWNER).unwrap();
        // Past the pause gate now; fails later on the unknown locker.
        let err = router
            .cc_burn(
                STRANGER,
                1_000_000,
                &LockingScript::new(vec![0xaa; 20]),
                ScriptType::P2wpkh,
                &LockingScript::new(vec![0x00]),
            )
            .unwrap_err();
        assert!(matches!(err, RouterError::UnknownLocker(_)));
    }

    #[test]
    fn test_fee_caps() {
        let router = build_router(Arc::new(MemoryRelay::new(0, 3)));
        assert!(router
            .set_protocol_percentage_fee(OWNER, MAX_PROTOCOL_FEE)
            .is_ok());
        assert!(router
            .set_protocol_percentage_fee(OWNER, MAX_PROTOCOL_FEE + 1)
            .is_err());
        assert!(router
            .set_slasher_percentage_reward(OWNER, MAX_SLASHER_REWARD + 1)
            .is_err());
    }
}
