//! Error types for Bitcoin transaction parsing.

use thiserror::Error;

use satbridge_core::types::ScriptType;

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, TxParseError>;

/// Errors raised while decoding a Bitcoin transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxParseError {
    /// Input ended before the expected field.
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    /// A CompactSize varint used a longer encoding than necessary.
    #[error("non-minimal CompactSize encoding")]
    NonMinimalVarint,

    /// Segwit marker present but the flag byte is not 0x01.
    #[error("unsupported segwit flag: {0:#04x}")]
    WitnessFlag(u8),

    /// Transaction has no inputs.
    #[error("transaction has no inputs")]
    EmptyInputs,

    /// Transaction has no outputs.
    #[error("transaction has no outputs")]
    EmptyOutputs,

    /// A declared element count cannot fit in the remaining bytes.
    #[error("implausible {what} count: {count} with {remaining} bytes remaining")]
    ImplausibleCount {
        /// The field being counted.
        what: &'static str,
        /// Declared count.
        count: u64,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Bytes left over after the transaction's end.
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    /// Input index beyond the transaction's vin.
    #[error("input index {index} out of range (vin length {len})")]
    InputOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of inputs.
        len: usize,
    },

    /// Output index beyond the transaction's vout.
    #[error("output index {index} out of range (vout length {len})")]
    OutputOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of outputs.
        len: usize,
    },

    /// Script payload length does not fit the script type.
    #[error("bad payload length for {script_type:?}: expected {expected}, got {got}")]
    BadPayloadLength {
        /// Template being built.
        script_type: ScriptType,
        /// Required payload size.
        expected: usize,
        /// Supplied payload size.
        got: usize,
    },
}
