//! Burn-request records.

use serde::{Deserialize, Serialize};

use satbridge_core::types::{Address, LockingScript, ScriptType};

/// A user's outstanding redemption, owed by a specific locker.
///
/// `is_transferred` is monotonic: once a request is discharged (by payment
/// proof or dispute) it never becomes outstanding again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnRequest {
    /// Wrapped BTC the user surrendered (pre-fee).
    pub amount: u128,
    /// BTC the locker must deliver (after protocol, locker and network fees).
    pub burnt_amount: u128,
    /// Target-chain address that paid.
    pub sender: Address,
    /// Destination payload on the Bitcoin side.
    pub user_script: LockingScript,
    /// Script template of the destination.
    pub script_type: ScriptType,
    /// Bitcoin height by which payment proof must exist.
    pub deadline: u64,
    /// Discharged flag.
    pub is_transferred: bool,
    /// Per-locker monotonic index for off-chain correlation.
    pub request_id_of_locker: u64,
}
