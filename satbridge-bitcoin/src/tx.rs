//! Transaction deserialization and txid computation.
//!
//! Supports the legacy and segwit serializations. The segwit marker, flag
//! and witness data are consumed but excluded from the txid, which is
//! sha256d over the stripped serialization.

use bitcoin::hashes::{sha256d, Hash};

use satbridge_core::types::{ScriptType, TxId};

use crate::error::{Result, TxParseError};
use crate::reader::{write_compact_size, Reader};
use crate::script;

/// Minimum serialized size of an input: outpoint(36) + script len(1) + sequence(4).
const MIN_INPUT_SIZE: usize = 41;
/// Minimum serialized size of an output: value(8) + script len(1).
const MIN_OUTPUT_SIZE: usize = 9;

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    /// Txid of the consumed output, internal byte order.
    pub previous_txid: TxId,
    /// Index of the consumed output.
    pub previous_vout: u32,
    /// Unlocking script.
    pub script_sig: Vec<u8>,
    /// Sequence number.
    pub sequence: u32,
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script.
    pub script_pubkey: Vec<u8>,
}

/// A fully parsed Bitcoin transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    /// Version field.
    pub version: u32,
    /// Inputs.
    pub inputs: Vec<ParsedInput>,
    /// Outputs.
    pub outputs: Vec<ParsedOutput>,
    /// Locktime field.
    pub locktime: u32,
    /// Whether the serialization carried witness data.
    pub has_witness: bool,
    txid: TxId,
}

impl ParsedTransaction {
    /// Parse a raw transaction. The whole buffer must be consumed.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut r = Reader::new(raw);

        let version = r.read_u32_le("version")?;

        // Segwit serialization replaces the input count with 0x00 0x01.
        let mut has_witness = false;
        let mut input_count = r.read_count("inputs", MIN_INPUT_SIZE)?;
        if input_count == 0 {
            let flag = r.read_u8("segwit flag")?;
            if flag != 0x01 {
                return Err(TxParseError::WitnessFlag(flag));
            }
            has_witness = true;
            input_count = r.read_count("inputs", MIN_INPUT_SIZE)?;
        }
        if input_count == 0 {
            return Err(TxParseError::EmptyInputs);
        }

        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let mut txid_bytes = [0u8; 32];
            txid_bytes.copy_from_slice(r.read_bytes(32, "outpoint txid")?);
            let previous_vout = r.read_u32_le("outpoint index")?;
            let script_len = r.read_count("script_sig", 1)?;
            let script_sig = r.read_bytes(script_len, "script_sig")?.to_vec();
            let sequence = r.read_u32_le("sequence")?;
            inputs.push(ParsedInput {
                previous_txid: TxId(txid_bytes),
                previous_vout,
                script_sig,
                sequence,
            });
        }

        let output_count = r.read_count("outputs", MIN_OUTPUT_SIZE)?;
        if output_count == 0 {
            return Err(TxParseError::EmptyOutputs);
        }
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let value = r.read_u64_le("output value")?;
            let script_len = r.read_count("script_pubkey", 1)?;
            let script_pubkey = r.read_bytes(script_len, "script_pubkey")?.to_vec();
            outputs.push(ParsedOutput {
                value,
                script_pubkey,
            });
        }

        if has_witness {
            for _ in 0..input_count {
                let item_count = r.read_count("witness items", 1)?;
                for _ in 0..item_count {
                    let item_len = r.read_count("witness item", 1)?;
                    r.read_bytes(item_len, "witness item")?;
                }
            }
        }

        let locktime = r.read_u32_le("locktime")?;

        if r.remaining() != 0 {
            return Err(TxParseError::TrailingBytes(r.remaining()));
        }

        let txid = if has_witness {
            let stripped = serialize_stripped(version, &inputs, &outputs, locktime);
            sha256d_txid(&stripped)
        } else {
            sha256d_txid(raw)
        };

        Ok(Self {
            version,
            inputs,
            outputs,
            locktime,
            has_witness,
            txid,
        })
    }

    /// Transaction id (sha256d of the stripped serialization).
    pub fn txid(&self) -> TxId {
        self.txid
    }

    /// The outpoint consumed by input `index`.
    pub fn outpoint(&self, index: usize) -> Result<(TxId, u32)> {
        let input = self
            .inputs
            .get(index)
            .ok_or(TxParseError::InputOutOfRange {
                index,
                len: self.inputs.len(),
            })?;
        Ok((input.previous_txid, input.previous_vout))
    }

    /// Sum of all output values. Widened to `u128`: a forged transaction may
    /// overflow `u64` and must not wrap.
    pub fn total_output_value(&self) -> u128 {
        self.outputs.iter().map(|o| o.value as u128).sum()
    }

    /// Locking script of output `index`.
    pub fn locking_script(&self, index: usize) -> Result<&[u8]> {
        self.outputs
            .get(index)
            .map(|o| o.script_pubkey.as_slice())
            .ok_or(TxParseError::OutputOutOfRange {
                index,
                len: self.outputs.len(),
            })
    }

    /// Value of output `index` if its locking script is exactly the template
    /// for `payload` under `script_type`; `None` on a script mismatch.
    pub fn output_value_matching(
        &self,
        index: usize,
        script_type: ScriptType,
        payload: &[u8],
    ) -> Result<Option<u64>> {
        let output = self
            .outputs
            .get(index)
            .ok_or(TxParseError::OutputOutOfRange {
                index,
                len: self.outputs.len(),
            })?;
        if script::matches(&output.script_pubkey, script_type, payload) {
            Ok(Some(output.value))
        } else {
            Ok(None)
        }
    }
}

fn sha256d_txid(bytes: &[u8]) -> TxId {
    let hash = sha256d::Hash::hash(bytes);
    TxId(*hash.as_byte_array())
}

fn serialize_stripped(
    version: u32,
    inputs: &[ParsedInput],
    outputs: &[ParsedOutput],
    locktime: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + inputs.len() * 48 + outputs.len() * 40);
    out.extend_from_slice(&version.to_le_bytes());
    write_compact_size(inputs.len() as u64, &mut out);
    for input in inputs {
        out.extend_from_slice(input.previous_txid.as_bytes());
        out.extend_from_slice(&input.previous_vout.to_le_bytes());
        write_compact_size(input.script_sig.len() as u64, &mut out);
        out.extend_from_slice(&input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
    write_compact_size(outputs.len() as u64, &mut out);
    for output in outputs {
        out.extend_from_slice(&output.value.to_le_bytes());
        write_compact_size(output.script_pubkey.len() as u64, &mut out);
        out.extend_from_slice(&output.script_pubkey);
    }
    out.extend_from_slice(&locktime.to_le_bytes());
    out
}

/// Raw-transaction builder for tests and tooling.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    version: u32,
    locktime: u32,
    segwit: bool,
    inputs: Vec<(TxId, u32)>,
    outputs: Vec<(u64, Vec<u8>)>,
}

impl TxBuilder {
    /// Start a version-2 transaction with locktime 0.
    pub fn new() -> Self {
        Self {
            version: 2,
            locktime: 0,
            segwit: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input spending `txid:vout` with an empty script sig.
    pub fn input(mut self, txid: TxId, vout: u32) -> Self {
        self.inputs.push((txid, vout));
        self
    }

    /// Add an output.
    pub fn output(mut self, value: u64, script_pubkey: impl Into<Vec<u8>>) -> Self {
        self.outputs.push((value, script_pubkey.into()));
        self
    }

    /// Set the locktime.
    pub fn locktime(mut self, locktime: u32) -> Self {
        self.locktime = locktime;
        self
    }

    /// Serialize with the segwit marker and empty witness stacks.
    pub fn segwit(mut self, segwit: bool) -> Self {
        self.segwit = segwit;
        self
    }

    /// Serialize to raw bytes.
    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        if self.segwit {
            out.push(0x00);
            out.push(0x01);
        }
        write_compact_size(self.inputs.len() as u64, &mut out);
        for (txid, vout) in &self.inputs {
            out.extend_from_slice(txid.as_bytes());
            out.extend_from_slice(&vout.to_le_bytes());
            write_compact_size(0, &mut out);
            out.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        }
        write_compact_size(self.outputs.len() as u64, &mut out);
        for (value, script_pubkey) in &self.outputs {
            out.extend_from_slice(&value.to_le_bytes());
            write_compact_size(script_pubkey.len() as u64, &mut out);
            out.extend_from_slice(script_pubkey);
        }
        if self.segwit {
            for _ in &self.inputs {
                write_compact_size(0, &mut out);
            }
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        out
    }
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satbridge_core::types::ScriptType;

    fn sample_tx() -> Vec<u8> {
        let spk = script::locking_script(ScriptType::P2wpkh, &[0xaa; 20]).unwrap();
        TxBuilder::new()
            .input(TxId([0x11; 32]), 3)
            .output(50_000, spk)
            .output(1_000, script::locking_script(ScriptType::P2pkh, &[0xbb; 20]).unwrap())
            .build()
    }

    #[test]
    fn test_parse_roundtrip() {
        let raw = sample_tx();
        let tx = ParsedTransaction::parse(&raw).unwrap();

        assert_eq!(tx.version, 2);
        assert_eq!(tx.locktime, 0);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outpoint(0).unwrap(), (TxId([0x11; 32]), 3));
        assert_eq!(tx.total_output_value(), 51_000);
        assert!(!tx.has_witness);
    }

    #[test]
    fn test_segwit_txid_matches_stripped() {
        let spk = script::locking_script(ScriptType::P2wpkh, &[0xaa; 20]).unwrap();
        let legacy = TxBuilder::new()
            .input(TxId([0x22; 32]), 0)
            .output(7_777, spk.clone())
            .build();
        let segwit = TxBuilder::new()
            .input(TxId([0x22; 32]), 0)
            .output(7_777, spk)
            .segwit(true)
            .build();

        let legacy_tx = ParsedTransaction::parse(&legacy).unwrap();
        let segwit_tx = ParsedTransaction::parse(&segwit).unwrap();

        assert!(segwit_tx.has_witness);
        assert_eq!(legacy_tx.txid(), segwit_tx.txid());
    }

    #[test]
    fn test_output_value_matching() {
        let raw = sample_tx();
        let tx = ParsedTransaction::parse(&raw).unwrap();

        assert_eq!(
            tx.output_value_matching(0, ScriptType::P2wpkh, &[0xaa; 20])
                .unwrap(),
            Some(50_000)
        );
        // Wrong payload.
        assert_eq!(
            tx.output_value_matching(0, ScriptType::P2wpkh, &[0xcc; 20])
                .unwrap(),
            None
        );
        // Wrong type.
        assert_eq!(
            tx.output_value_matching(0, ScriptType::P2pkh, &[0xaa; 20])
                .unwrap(),
            None
        );
        // Out of range.
        assert!(tx
            .output_value_matching(5, ScriptType::P2wpkh, &[0xaa; 20])
            .is_err());
    }

    #[test]
    fn test_truncated_rejected() {
        let raw = sample_tx();
        for cut in 1..raw.len() {
            assert!(
                ParsedTransaction::parse(&raw[..cut]).is_err(),
                "truncation at {cut} must fail"
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut raw = sample_tx();
        raw.push(0x00);
        assert!(matches!(
            ParsedTransaction::parse(&raw),
            Err(TxParseError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_empty_vectors_rejected() {
        // No outputs.
        let raw = TxBuilder::new().input(TxId([0x01; 32]), 0).build();
        assert!(matches!(
            ParsedTransaction::parse(&raw),
            Err(TxParseError::EmptyOutputs)
        ));

        // No inputs: the zero count reads as a segwit marker and the next
        // byte is not a valid flag.
        let raw = TxBuilder::new().output(1, vec![0x51]).build();
        assert!(ParsedTransaction::parse(&raw).is_err());
    }

    #[test]
    fn test_forged_count_rejected() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&2u32.to_le_bytes());
        // Claims 0xffff inputs with almost nothing behind it.
        raw.extend_from_slice(&[0xfd, 0xff, 0xff, 0x00]);
        assert!(matches!(
            ParsedTransaction::parse(&raw),
            Err(TxParseError::ImplausibleCount { .. })
        ));
    }
}
