//! Error types for the burn router.

use thiserror::Error;

use satbridge_bitcoin::TxParseError;
use satbridge_core::error::CoreError;
use satbridge_core::types::{Address, LockingScript, ScriptType, TxId};
use satbridge_ledger::LedgerError;
use satbridge_lockers::LockerError;
use satbridge_relay::RelayError;

/// Result type for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Errors raised by router operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// User script payload length does not fit the script type.
    #[error("user script for {script_type:?} must be {expected} bytes, got {got}")]
    BadUserScript {
        /// Requested template.
        script_type: ScriptType,
        /// Required payload size.
        expected: usize,
        /// Supplied payload size.
        got: usize,
    },

    /// No approved locker controls the given locking script.
    #[error("no locker with locking script {0}")]
    UnknownLocker(LockingScript),

    /// Burn amount below the dust floor.
    #[error("amount {amount} below dust floor {minimum}")]
    BelowDust {
        /// Offered amount.
        amount: u128,
        /// Protocol fee plus twice the Bitcoin fee.
        minimum: u128,
    },

    /// Proof or dispute referencing a block before the starting bound.
    #[error("block {block} precedes starting block {starting}")]
    BeforeStartingBlock {
        /// Referenced block.
        block: u64,
        /// Configured lower bound.
        starting: u64,
    },

    /// Payment transaction with a non-zero locktime.
    #[error("payment transaction has non-zero locktime {0}")]
    NonzeroLocktime(u32),

    /// Request and output index arrays of different lengths.
    #[error("{requests} request indexes but {vouts} vout indexes")]
    LengthMismatch {
        /// Request index count.
        requests: usize,
        /// Vout index count.
        vouts: usize,
    },

    /// Vout indexes not strictly increasing.
    #[error("vout indexes must be strictly increasing")]
    UnsortedVoutIndexes,

    /// Request index beyond the locker's request list.
    #[error("request index {index} out of range ({len} requests)")]
    RequestOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of requests.
        len: usize,
    },

    /// Dispute of an already discharged request.
    #[error("request {index} already transferred")]
    AlreadyTransferred {
        /// Offending index.
        index: usize,
    },

    /// Dispute of a request whose deadline has not yet passed.
    #[error("deadline {deadline} not yet elapsed (relay tip {tip})")]
    DeadlineNotElapsed {
        /// Request deadline.
        deadline: u64,
        /// Relay tip height.
        tip: u64,
    },

    /// Dispute of a request from before the starting bound.
    #[error("request {index} predates the starting block")]
    StaleRequest {
        /// Offending index.
        index: usize,
    },

    /// The relay rejected the Merkle branch.
    #[error("inclusion proof for {0} did not verify")]
    InvalidInclusionProof(TxId),

    /// The disputed spend was a legitimate burn payment.
    #[error("transaction {0} already accepted as burn proof")]
    AlreadyUsedAsBurnProof(TxId),

    /// Locker dispute attempted inside the transfer window.
    #[error("spend at block {block} disputable only after relay height {allowed_after}")]
    DisputeTooEarly {
        /// Block of the disputed spend.
        block: u64,
        /// Relay height after which the dispute opens.
        allowed_after: u64,
    },

    /// The spent outpoint does not come from the presented funding tx.
    #[error("outpoint txid {expected} does not match funding tx {got}")]
    OutpointMismatch {
        /// Txid named by the input.
        expected: TxId,
        /// Txid of the presented funding transaction.
        got: TxId,
    },

    /// The consumed output does not belong to the accused locker.
    #[error("consumed output is not locked to the accused locker")]
    ScriptMismatch,

    /// Caller is not the Bitcoin fee oracle.
    #[error("caller {caller} is not the bitcoin fee oracle")]
    NotFeeOracle {
        /// Rejected caller.
        caller: Address,
    },

    /// A fee or reward ratio above its 100% cap.
    #[error("{what} out of range: {value}")]
    FeeOutOfRange {
        /// Parameter name.
        what: &'static str,
        /// Rejected value.
        value: u128,
    },

    /// Transfer deadline must exceed the relay's finalization parameter.
    #[error("transfer deadline {deadline} must exceed finalization parameter {finalization}")]
    TransferDeadlineTooShort {
        /// Proposed deadline.
        deadline: u64,
        /// Relay finalization parameter.
        finalization: u64,
    },

    /// Starting block number must strictly increase.
    #[error("starting block {proposed} not above current {current}")]
    StartingBlockNotIncreasing {
        /// Current bound.
        current: u64,
        /// Rejected proposal.
        proposed: u64,
    },

    /// Malformed Bitcoin transaction.
    #[error(transparent)]
    Parse(#[from] TxParseError),

    /// Relay failure.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Registry failure.
    #[error(transparent)]
    Locker(#[from] LockerError),

    /// Ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Guard failure from the core primitives.
    #[error(transparent)]
    Core(#[from] CoreError),
}
