//! Splitting a serialized FORKID preimage back into its fields.

use serde::{Deserialize, Serialize};
use txengine_primitives::util::{VarInt, WireReader};
use txengine_primitives::PrimitivesError;

use super::report::PreimageField;
use crate::TransactionError;

/// The fields of a FORKID preimage, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreimageFields {
    pub version: u32,
    pub hash_prevouts: [u8; 32],
    pub hash_sequence: [u8; 32],
    pub outpoint_txid: [u8; 32],
    pub outpoint_index: u32,
    pub script_code: Vec<u8>,
    /// Width of the scriptCode length prefix: 1, 3, 5 or 9 bytes.
    pub script_code_len_width: usize,
    pub amount: u64,
    pub sequence: u32,
    pub hash_outputs: [u8; 32],
    pub lock_time: u32,
    pub sighash_flag: u32,
}

impl PreimageFields {
    /// Parse `bytes` as a complete preimage. Truncated input and trailing
    /// bytes are errors.
    pub fn parse(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = WireReader::new(bytes);
        let err = |what: &str, e: PrimitivesError| {
            TransactionError::InvalidPreimage(format!("reading {}: {}", what, e))
        };

        let version = reader.read_u32_le().map_err(|e| err("version", e))?;
        let hash_prevouts: [u8; 32] = reader.read_array().map_err(|e| err("hashPrevouts", e))?;
        let hash_sequence: [u8; 32] = reader.read_array().map_err(|e| err("hashSequence", e))?;
        let outpoint_txid: [u8; 32] = reader.read_array().map_err(|e| err("outpoint txid", e))?;
        let outpoint_index = reader.read_u32_le().map_err(|e| err("outpoint index", e))?;

        let len_start = reader.position();
        let script_code = reader
            .read_var_bytes()
            .map_err(|e| err("scriptCode", e))?
            .to_vec();
        let script_code_len_width = reader.position() - len_start - script_code.len();

        let amount = reader.read_u64_le().map_err(|e| err("amount", e))?;
        let sequence = reader.read_u32_le().map_err(|e| err("sequence", e))?;
        let hash_outputs: [u8; 32] = reader.read_array().map_err(|e| err("hashOutputs", e))?;
        let lock_time = reader.read_u32_le().map_err(|e| err("lock time", e))?;
        let sighash_flag = reader.read_u32_le().map_err(|e| err("sighash flag", e))?;

        if reader.remaining() != 0 {
            return Err(TransactionError::InvalidPreimage(format!(
                "trailing {} bytes after sighash flag",
                reader.remaining()
            )));
        }

        Ok(PreimageFields {
            version,
            hash_prevouts,
            hash_sequence,
            outpoint_txid,
            outpoint_index,
            script_code,
            script_code_len_width,
            amount,
            sequence,
            hash_outputs,
            lock_time,
            sighash_flag,
        })
    }

    pub fn hash(&self, field: PreimageField) -> &[u8; 32] {
        match field {
            PreimageField::HashPrevouts => &self.hash_prevouts,
            PreimageField::HashSequence => &self.hash_sequence,
            PreimageField::HashOutputs => &self.hash_outputs,
        }
    }

    /// Byte offset of `hashOutputs` in the serialized preimage.
    pub fn hash_outputs_offset(&self) -> usize {
        104 + self.script_code_len_width + self.script_code.len() + 12
    }

    /// Whether the length prefix used the minimal varint width.
    pub fn is_minimal_length_prefix(&self) -> bool {
        VarInt::from(self.script_code.len()).length() == self.script_code_len_width
    }
}
