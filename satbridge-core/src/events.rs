//! Observable events emitted by the peg components.
//!
//! Every state transition named by the protocol is appended to a shared
//! [`EventLog`] and mirrored to `tracing`. Watchers and tests consume the
//! log; nothing inside the peg reads it back.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::{Address, LockingScript, ScriptType, TxId};

/// Which slashing path seized the collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashKind {
    /// Missed redemption deadline.
    Idle,
    /// Provably unauthorized spend.
    Thief,
}

/// Events observable from the three peg components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BridgeEvent {
    /// A user surrendered wrapped BTC for redemption.
    CcBurn {
        sender: Address,
        locker: Address,
        user_script: LockingScript,
        script_type: ScriptType,
        amount: u128,
        burnt_amount: u128,
        request_index: u64,
        deadline: u64,
    },
    /// A burn request was discharged by a Bitcoin payment.
    PaidCcBurn {
        locker: Address,
        request_index: u64,
        tx_id: TxId,
    },
    /// A locker was slashed for missing a redemption deadline.
    BurnDispute {
        locker: Address,
        request_index: u64,
        disputer: Address,
    },
    /// A locker was slashed for an unauthorized Bitcoin spend.
    LockerDispute {
        locker: Address,
        tx_id: TxId,
        disputer: Address,
        slashed_amount: u128,
    },
    /// A candidacy request with locked collateral.
    RequestAddLocker {
        candidate: Address,
        locking_script: LockingScript,
        collateral: u128,
    },
    /// A candidate withdrew and was refunded.
    RevokeAddLockerRequest { candidate: Address },
    /// A candidate was approved as a locker.
    LockerAdded {
        locker: Address,
        locking_script: LockingScript,
        collateral: u128,
    },
    /// A locker asked to become inactive.
    RequestInactivateLocker {
        locker: Address,
        inactivation_timestamp: i64,
    },
    /// An inactive locker re-activated.
    ActivateLocker { locker: Address },
    /// A locker exited and reclaimed collateral.
    LockerRemoved { locker: Address },
    /// Collateral was seized from a locker.
    LockerSlashed {
        locker: Address,
        kind: SlashKind,
        amount_btc: u128,
        reward_recipient: Address,
    },
    /// An unhealthy locker's collateral was bought at discount.
    LockerLiquidated {
        locker: Address,
        buyer: Address,
        collateral_amount: u128,
        paid_amount: u128,
    },
    /// Previously slashed collateral was sold off.
    LockerSlashedCollateralSold {
        locker: Address,
        buyer: Address,
        collateral_amount: u128,
        paid_amount: u128,
    },
    /// Collateral topped up.
    CollateralAdded {
        locker: Address,
        adder: Address,
        amount: u128,
        total: u128,
    },
    /// Surplus collateral withdrawn.
    CollateralRemoved {
        locker: Address,
        amount: u128,
        total: u128,
    },
    /// Wrapped BTC minted.
    Mint { to: Address, amount: u128 },
    /// Wrapped BTC burnt.
    Burn { from: Address, amount: u128 },
    /// Account blacklisted.
    Blacklisted { account: Address },
    /// Account removed from the blacklist.
    UnBlacklisted { account: Address },
}

/// Append-only in-memory event log shared by the peg components.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<BridgeEvent>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and mirror it to tracing.
    pub fn emit(&self, event: BridgeEvent) {
        tracing::info!(?event, "bridge event");
        self.events.lock().push(event);
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Copy of all recorded events.
    pub fn snapshot(&self) -> Vec<BridgeEvent> {
        self.events.lock().clone()
    }

    /// Whether any recorded event satisfies `pred`.
    pub fn any(&self, pred: impl Fn(&BridgeEvent) -> bool) -> bool {
        self.events.lock().iter().any(pred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_snapshot() {
        let log = EventLog::new();
        assert!(log.is_empty());

        log.emit(BridgeEvent::Mint {
            to: Address::repeat(1),
            amount: 42,
        });
        log.emit(BridgeEvent::Burn {
            from: Address::repeat(1),
            amount: 7,
        });

        assert_eq!(log.len(), 2);
        assert!(log.any(|e| matches!(e, BridgeEvent::Burn { amount: 7, .. })));
    }

    #[test]
    fn test_events_serialize() {
        let event = BridgeEvent::Blacklisted {
            account: Address::repeat(9),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Blacklisted"));
    }
}
