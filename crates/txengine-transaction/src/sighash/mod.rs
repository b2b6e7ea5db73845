//! Signature hash computation.
//!
//! Two digests exist. The FORKID digest ([`signature_hash`]) hashes the
//! BIP143-style preimage built by [`calc_preimage`] and commits to the spent
//! amount. The legacy digest ([`legacy_signature_hash`]) hashes a modified
//! copy of the whole transaction and is only reachable without
//! `ENABLE_SIGHASH_FORKID`.
//!
//! See <https://github.com/bitcoin-sv/bitcoin-sv/blob/master/doc/abc/replay-protected-sighash.md#digest-algorithm>

pub mod layout;
pub mod report;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use txengine_primitives::hash::sha256d;
use txengine_primitives::util::{VarInt, WireWriter};
use txengine_script::chunk::read_chunk;
use txengine_script::opcodes::OP_CODESEPARATOR;

use crate::transaction::Transaction;
use crate::TransactionError;

pub use layout::PreimageFields;
pub use report::{
    conformance_table, FieldMismatch, HashOutputsRule, PreimageField, ZeroField, ZeroFieldReport,
    ZeroReason,
};

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs (the default).
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs, allowing outputs to be modified.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output with the same index as the signed input.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Combined with another flag: only sign the current input, allowing other
/// inputs to be added later.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Replay-protection flag selecting the BIP143-style digest.
pub const SIGHASH_FORKID: u32 = 0x40;

/// The standard sighash type: ALL | FORKID.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Mask applied to extract the base sighash type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

/// The legacy digest of a SIGHASH_SINGLE signature whose input has no
/// matching output: the integer 1, little-endian.
pub const LEGACY_SINGLE_OUT_OF_RANGE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

/// Which outputs a sighash flag commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseSighash {
    All,
    None,
    Single,
}

/// A sighash flag as carried in the last byte of a script signature
/// (and widened to 4 bytes inside preimages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashType(pub u32);

impl SighashType {
    pub const ALL_FORKID: SighashType = SighashType(SIGHASH_ALL_FORKID);

    /// Base mode. Unknown base values hash like ALL.
    pub fn base(self) -> BaseSighash {
        match self.0 & SIGHASH_MASK {
            SIGHASH_NONE => BaseSighash::None,
            SIGHASH_SINGLE => BaseSighash::Single,
            _ => BaseSighash::All,
        }
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    pub fn has_forkid(self) -> bool {
        self.0 & SIGHASH_FORKID != 0
    }

    /// Accept `flag` only if it fits the one byte a script signature
    /// carries.
    pub fn try_from_u32(flag: u32) -> Result<Self, TransactionError> {
        if flag > 0xff {
            return Err(TransactionError::InvalidSighashFlag(flag));
        }
        Ok(SighashType(flag))
    }
}

impl From<u32> for SighashType {
    fn from(flag: u32) -> Self {
        SighashType(flag)
    }
}

// -----------------------------------------------------------------------
// FORKID signature hash
// -----------------------------------------------------------------------

/// Compute the FORKID signature hash for a given input: sha256d of
/// [`calc_preimage`].
///
/// # Arguments
/// * `tx`          - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `script_code` - The script the signature commits to (normally the
///   spent output's locking script).
/// * `satoshis`    - The amount of the output being spent.
/// * `sighash_flag` - The combined sighash flags (e.g. `SIGHASH_ALL_FORKID`).
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    satoshis: u64,
    sighash_flag: u32,
) -> Result<[u8; 32], TransactionError> {
    let preimage = calc_preimage(tx, input_index, script_code, satoshis, sighash_flag)?;
    Ok(sha256d(&preimage))
}

/// Compute the preimage bytes for the FORKID sighash before double-hashing.
///
/// The preimage consists of:
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - sha256d of all outpoints unless ANYONECANPAY
/// 3. hashSequence (32 bytes) - sha256d of all sequences unless ANYONECANPAY/SINGLE/NONE
/// 4. outpoint (32+4 bytes) - txid + vout of the input being signed
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE) - satoshis of the output being spent
/// 7. nSequence (4 bytes LE) - sequence of the input being signed
/// 8. hashOutputs (32 bytes) - see [`HashOutputsRule`]
/// 9. nLocktime (4 bytes LE)
/// 10. sighash flag (4 bytes LE)
///
/// # Errors
/// `InputIndex` when `input_index` is out of range, `InvalidSighashFlag`
/// when the flag does not fit the signature's trailing byte. The flag is
/// never masked, so the high three bytes of field 10 are always zero.
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    satoshis: u64,
    sighash_flag: u32,
) -> Result<Vec<u8>, TransactionError> {
    let input = tx.input(input_index)?;
    let flag = SighashType::try_from_u32(sighash_flag)?;
    let report = ZeroFieldReport::for_flag(sighash_flag, input_index, tx.outputs.len());

    let hash_prevouts = if report.is_zero(PreimageField::HashPrevouts) {
        [0u8; 32]
    } else {
        prevouts_hash(tx)
    };

    let hash_sequence = if report.is_zero(PreimageField::HashSequence) {
        [0u8; 32]
    } else {
        sequence_hash(tx)
    };

    let hash_outputs = match report.outputs_rule {
        HashOutputsRule::AllOutputs => outputs_hash(tx, None),
        HashOutputsRule::MatchingOutput => outputs_hash(tx, Some(input_index)),
        HashOutputsRule::NoOutputs => [0u8; 32],
        HashOutputsRule::SingleOutOfRange => {
            warn!(
                "SIGHASH_SINGLE on input {} with only {} outputs, hashOutputs is zero",
                input_index,
                tx.outputs.len()
            );
            [0u8; 32]
        }
    };

    let mut writer = WireWriter::with_capacity(156 + script_code.len() + 9);
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.write_outpoint(&mut writer);
    writer.write_varint(VarInt::from(script_code.len()));
    writer.write_bytes(script_code);
    writer.write_u64_le(satoshis);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_flag);

    debug!(
        "built {}-byte preimage for input {} ({:?}, anyonecanpay={})",
        writer.len(),
        input_index,
        flag.base(),
        flag.anyone_can_pay()
    );
    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Legacy signature hash
// -----------------------------------------------------------------------

/// Compute the pre-FORKID signature hash.
///
/// Serializes a copy of `tx` in which every unlocking script is empty
/// except the signed input's, which is `script_code` without its
/// OP_CODESEPARATORs. NONE drops all outputs, SINGLE keeps outputs up to
/// the input's index (earlier ones blanked), and both zero the other
/// inputs' sequences. ANYONECANPAY keeps only the signed input. The
/// 4-byte flag is appended before hashing.
///
/// SINGLE without a matching output yields [`LEGACY_SINGLE_OUT_OF_RANGE`].
pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    sighash_flag: u32,
) -> Result<[u8; 32], TransactionError> {
    tx.input(input_index)?;
    let flag = SighashType::try_from_u32(sighash_flag)?;
    let base = flag.base();

    if base == BaseSighash::Single && input_index >= tx.outputs.len() {
        warn!(
            "legacy SIGHASH_SINGLE on input {} with only {} outputs, digest is 1",
            input_index,
            tx.outputs.len()
        );
        return Ok(LEGACY_SINGLE_OUT_OF_RANGE);
    }

    let script_code = remove_code_separators(script_code);
    let mut writer = WireWriter::with_capacity(256 + script_code.len());
    writer.write_u32_le(tx.version);

    let signed_inputs: Vec<usize> = if flag.anyone_can_pay() {
        vec![input_index]
    } else {
        (0..tx.inputs.len()).collect()
    };
    writer.write_varint(VarInt::from(signed_inputs.len()));
    for idx in signed_inputs {
        let input = &tx.inputs[idx];
        input.write_outpoint(&mut writer);
        if idx == input_index {
            writer.write_var_bytes(&script_code);
            writer.write_u32_le(input.sequence_number);
        } else {
            writer.write_var_bytes(&[]);
            let sequence = match base {
                BaseSighash::All => input.sequence_number,
                BaseSighash::None | BaseSighash::Single => 0,
            };
            writer.write_u32_le(sequence);
        }
    }

    match base {
        BaseSighash::All => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
        BaseSighash::None => writer.write_varint(VarInt::from(0u64)),
        BaseSighash::Single => {
            writer.write_varint(VarInt::from(input_index + 1));
            for _ in 0..input_index {
                writer.write_u64_le(u64::MAX);
                writer.write_var_bytes(&[]);
            }
            tx.outputs[input_index].write_to(&mut writer);
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_flag);
    Ok(sha256d(writer.as_bytes()))
}

/// Drop every OP_CODESEPARATOR opcode from `script`, leaving pushes that
/// merely contain the byte intact. A truncated trailing push is kept as is.
pub fn remove_code_separators(script: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(script.len());
    let mut pos = 0;
    while pos < script.len() {
        match read_chunk(script, pos) {
            Ok((chunk, next)) => {
                if chunk.op != OP_CODESEPARATOR {
                    out.extend_from_slice(&script[pos..next]);
                }
                pos = next;
            }
            Err(_) => {
                out.extend_from_slice(&script[pos..]);
                break;
            }
        }
    }
    out
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

/// sha256d of all outpoints (txid + LE vout) concatenated.
fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        input.write_outpoint(&mut writer);
    }
    sha256d(writer.as_bytes())
}

/// sha256d of all input sequence numbers concatenated.
fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

/// sha256d of all serialized outputs, or of the single output at `only`.
fn outputs_hash(tx: &Transaction, only: Option<usize>) -> [u8; 32] {
    let mut writer = WireWriter::new();
    match only {
        Some(n) => tx.outputs[n].write_to(&mut writer),
        None => {
            for output in &tx.outputs {
                output.write_to(&mut writer);
            }
        }
    }
    sha256d(writer.as_bytes())
}
