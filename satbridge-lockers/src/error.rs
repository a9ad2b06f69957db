//! Error types for the locker registry.

use thiserror::Error;

use satbridge_core::error::CoreError;
use satbridge_core::types::{Address, LockingScript};
use satbridge_ledger::LedgerError;

use crate::oracle::OracleError;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, LockerError>;

/// Failure reported by the burn-routing handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("burn routing failed: {0}")]
pub struct RoutingError(pub String);

/// Errors raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockerError {
    /// Caller is not the configured burn router.
    #[error("caller {caller} is not the burn router")]
    NotBurnRouter {
        /// Rejected caller.
        caller: Address,
    },

    /// Caller is not a registry minter.
    #[error("caller {caller} is not a registry minter")]
    NotMinter {
        /// Rejected caller.
        caller: Address,
    },

    /// Caller is not a registry burner.
    #[error("caller {caller} is not a registry burner")]
    NotBurner {
        /// Rejected caller.
        caller: Address,
    },

    /// Duplicate minter/burner grant or revocation of an absent grant.
    #[error("registry role change rejected for {account}")]
    RoleChangeRejected {
        /// Target account.
        account: Address,
    },

    /// The locking script already belongs to a candidate or locker.
    #[error("locking script {0} already registered")]
    ScriptAlreadyRegistered(LockingScript),

    /// The caller is already a candidate or locker.
    #[error("account {account} is already a candidate or locker")]
    AlreadyRegistered {
        /// Offending account.
        account: Address,
    },

    /// Candidacy collateral below the configured minimum.
    #[error("collateral {provided} below required minimum {min}")]
    CollateralBelowMinimum {
        /// Collateral offered.
        provided: u128,
        /// Configured minimum.
        min: u128,
    },

    /// No locker at the given target address.
    #[error("no locker at {target}")]
    LockerNotFound {
        /// Queried address.
        target: Address,
    },

    /// No locker controls the given locking script.
    #[error("no locker with locking script {0}")]
    UnknownLockingScript(LockingScript),

    /// Candidate-only operation on a non-candidate.
    #[error("account {account} is not a candidate")]
    NotCandidate {
        /// Offending account.
        account: Address,
    },

    /// The locker must be active for this operation.
    #[error("locker {target} is not active")]
    LockerNotActive {
        /// Offending locker.
        target: Address,
    },

    /// The locker must be inactive for this operation.
    #[error("locker {target} is still active")]
    StillActive {
        /// Offending locker.
        target: Address,
    },

    /// Inactivation requested twice.
    #[error("locker {target} already has a pending inactivation")]
    AlreadyInactivated {
        /// Offending locker.
        target: Address,
    },

    /// Withdrawal or sale larger than the held collateral.
    #[error("requested {requested} collateral, only {available} held")]
    InsufficientCollateral {
        /// Requested amount.
        requested: u128,
        /// Amount held.
        available: u128,
    },

    /// Withdrawal would leave the locker under-collateralized.
    #[error("withdrawal would leave capacity below net minted ({net_minted})")]
    WouldUndercollateralize {
        /// Outstanding minted amount.
        net_minted: u128,
    },

    /// Mint above the locker's remaining capacity.
    #[error("mint of {requested} exceeds capacity {available}")]
    InsufficientCapacity {
        /// Requested amount.
        requested: u128,
        /// Capacity left.
        available: u128,
    },

    /// Burn larger than the locker's outstanding minted amount.
    #[error("burn needs net minted {need}, locker has {have}")]
    InsufficientNetMinted {
        /// Amount to retire.
        need: u128,
        /// Outstanding minted amount.
        have: u128,
    },

    /// Liquidation attempted on a healthy locker.
    #[error("locker {target} is healthy")]
    LockerHealthy {
        /// Offending locker.
        target: Address,
    },

    /// Liquidation larger than the buyable bound.
    #[error("liquidation of {requested} exceeds maximum buyable {max}")]
    ExceedsMaxBuyable {
        /// Requested collateral.
        requested: u128,
        /// Maximum buyable collateral.
        max: u128,
    },

    /// Slashed-collateral sale on a locker with nothing pending.
    #[error("locker {target} has no slashed collateral pending sale")]
    NoSlashedCollateral {
        /// Queried locker.
        target: Address,
    },

    /// Sale would over-fill the pending slashed amount.
    #[error("sale worth {requested} exceeds pending slashed amount {available}")]
    ExceedsSlashedAmount {
        /// Wrapped-BTC value of the sale.
        requested: u128,
        /// Pending slashed amount.
        available: u128,
    },

    /// Removal with outstanding minted supply.
    #[error("locker still has {net_minted} net minted")]
    NonzeroNetMinted {
        /// Outstanding minted amount.
        net_minted: u128,
    },

    /// Removal with a pending slashed-collateral sale.
    #[error("locker still has {pending} slashed wrapped-BTC pending sale")]
    PendingSlashedSale {
        /// Pending slashed amount.
        pending: u128,
    },

    /// A ratio parameter violates its bounds.
    #[error("{what} out of range: {value}")]
    RatioOutOfRange {
        /// Parameter name.
        what: &'static str,
        /// Rejected value.
        value: u128,
    },

    /// Zero amount where a positive amount is required.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Liquidation attempted before a burn router was configured.
    #[error("no burn router configured")]
    RouterNotConfigured,

    /// Price oracle failure.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Wrapped-ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Burn-routing failure.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Guard or balance failure from the core primitives.
    #[error(transparent)]
    Core(#[from] CoreError),
}
