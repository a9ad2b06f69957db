//! Error types shared by the peg components.

use thiserror::Error;

use crate::types::Address;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the core primitives (guards, accounts, math).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Caller is not the owner of the component.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// The rejected caller.
        caller: Address,
    },

    /// The zero address was supplied where a real principal is required.
    #[error("zero address")]
    ZeroAddress,

    /// Nested entry into a guarded operation.
    #[error("reentrant call")]
    Reentrancy,

    /// The component is paused.
    #[error("component is paused")]
    Paused,

    /// Account balance too low for the requested movement.
    #[error("insufficient balance for {account}: need {need}, have {have}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Amount required.
        need: u128,
        /// Amount available.
        have: u128,
    },

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Division by zero in monetary math.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),
}
