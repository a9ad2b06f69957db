//! The locker record.

use serde::{Deserialize, Serialize};

use satbridge_core::types::{LockingScript, ScriptType};

/// A Bitcoin-custody operator tracked by the registry.
///
/// `is_candidate` and `is_locker` are mutually exclusive role flags.
/// `inactivation_timestamp == 0` means active; otherwise it is the wall
/// clock at which the locker becomes inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locker {
    /// Bitcoin scriptPubKey the locker controls (unique across lockers).
    pub locking_script: LockingScript,
    /// Bitcoin destination for forced redemptions.
    pub rescue_script: LockingScript,
    /// Script type of the rescue destination.
    pub rescue_type: ScriptType,
    /// Native collateral held by the registry.
    pub native_locked: u128,
    /// Wrapped BTC minted minus burnt through this locker. Never negative.
    pub net_minted: u128,
    /// Wrapped BTC owed from past slashing, pending the discounted sale.
    pub slashing_btc_amount: u128,
    /// Awaiting owner approval.
    pub is_candidate: bool,
    /// Approved operator.
    pub is_locker: bool,
    /// 0 = active; otherwise inactivation wall clock.
    pub inactivation_timestamp: i64,
}

impl Locker {
    /// A fresh candidacy with locked collateral.
    pub fn candidate(
        locking_script: LockingScript,
        rescue_type: ScriptType,
        rescue_script: LockingScript,
        native_locked: u128,
    ) -> Self {
        Self {
            locking_script,
            rescue_script,
            rescue_type,
            native_locked,
            net_minted: 0,
            slashing_btc_amount: 0,
            is_candidate: true,
            is_locker: false,
            inactivation_timestamp: 0,
        }
    }

    /// Whether the locker may mint at wall clock `now`.
    pub fn is_active(&self, now: i64) -> bool {
        self.is_locker && (self.inactivation_timestamp == 0 || now < self.inactivation_timestamp)
    }

    /// Whether the inactivation delay has elapsed at wall clock `now`.
    pub fn is_inactive(&self, now: i64) -> bool {
        self.is_locker && self.inactivation_timestamp != 0 && now >= self.inactivation_timestamp
    }
}
