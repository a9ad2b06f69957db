//! Error types for the relay interface.

use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors raised by a relay implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No header stored at the queried height.
    #[error("no header at height {0}")]
    MissingHeader(u64),

    /// The queried header is not yet finalized.
    #[error("header at height {height} not finalized (tip {tip}, need {need} confirmations)")]
    NotFinalized {
        /// Queried height.
        height: u64,
        /// Current tip height.
        tip: u64,
        /// Finalization parameter.
        need: u64,
    },
}
