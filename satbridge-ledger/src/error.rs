//! Error types for the wrapped-BTC ledger.

use thiserror::Error;

use satbridge_core::error::CoreError;
use satbridge_core::types::Address;

use crate::ledger::Role;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Caller lacks the role the operation requires.
    #[error("caller {caller} does not hold role {role:?}")]
    MissingRole {
        /// Rejected caller.
        caller: Address,
        /// Required role.
        role: Role,
    },

    /// Role grant to an account that already holds it.
    #[error("account {account} already holds role {role:?}")]
    RoleAlreadyGranted {
        /// Target account.
        account: Address,
        /// Duplicated role.
        role: Role,
    },

    /// Role revocation from an account that does not hold it.
    #[error("account {account} does not hold role {role:?}")]
    RoleNotGranted {
        /// Target account.
        account: Address,
        /// Missing role.
        role: Role,
    },

    /// A blacklisted account on either end of a transfer.
    #[error("account {account} is blacklisted")]
    Blacklisted {
        /// Offending account.
        account: Address,
    },

    /// Un-blacklisting an account that is not blacklisted.
    #[error("account {account} is not blacklisted")]
    NotBlacklisted {
        /// Target account.
        account: Address,
    },

    /// Zero amount where a positive amount is required.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Spender allowance too low.
    #[error("allowance of {spender} over {owner} too low: need {need}, have {have}")]
    InsufficientAllowance {
        /// Token owner.
        owner: Address,
        /// Approved spender.
        spender: Address,
        /// Amount required.
        need: u128,
        /// Amount approved.
        have: u128,
    },

    /// Single mint above the configured per-mint maximum.
    #[error("mint of {amount} above max mint limit {max}")]
    OverMintLimit {
        /// Requested amount.
        amount: u128,
        /// Configured maximum.
        max: u128,
    },

    /// Mint above the epoch's remaining budget.
    #[error("mint of {requested} exceeds epoch budget ({remaining} remaining)")]
    EpochBudgetExceeded {
        /// Requested amount.
        requested: u128,
        /// Budget left this epoch.
        remaining: u128,
    },

    /// Epoch length must be positive.
    #[error("epoch length must be non-zero")]
    ZeroEpochLength,

    /// Guard or balance failure from the core primitives.
    #[error(transparent)]
    Core(#[from] CoreError),
}
