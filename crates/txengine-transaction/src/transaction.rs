//! Core transaction type.
//!
//! A transaction is a version, ordered inputs, ordered outputs and a lock
//! time. The engine reads transactions to build signing digests and to
//! verify scripts; it never mutates them.

use log::debug;
use txengine_primitives::hash::sha256d;
use txengine_primitives::util::{VarInt, WireReader, WireWriter};
use txengine_script::Script;

use crate::input::TransactionInput;
use crate::output::TransactionOutput;
use crate::sighash::{self, SighashType};
use crate::TransactionError;

/// A transaction consisting of a version, a set of inputs, a set of
/// outputs, and a lock time.
///
/// # Wire format
///
/// | Field        | Size                      |
/// |--------------|---------------------------|
/// | version      | 4 bytes (LE)              |
/// | input count  | VarInt                    |
/// | inputs       | variable (per input)      |
/// | output count | VarInt                    |
/// | outputs      | variable (per output)     |
/// | lock_time    | 4 bytes (LE)              |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction format version. Relative lock times need 2 or more.
    pub version: u32,

    pub inputs: Vec<TransactionInput>,

    pub outputs: Vec<TransactionOutput>,

    /// Block height (below 500 000 000) or Unix time before which the
    /// transaction is not final.
    pub lock_time: u32,
}

impl Transaction {
    /// Create a new empty transaction with version 1 and lock time 0.
    pub fn new() -> Self {
        Transaction {
            version: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - The full serialized transaction as hex.
    ///
    /// # Returns
    /// The transaction, or `SerializationError` for bad hex or a bad
    /// encoding.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str).map_err(|e| {
            TransactionError::SerializationError(format!("invalid hex: {}", e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// The slice must hold exactly one complete transaction; trailing
    /// bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = WireReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::SerializationError(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `WireReader`.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading version: {}", e))
        })?;

        let input_count = read_count(reader, "input")?;
        let mut inputs = Vec::with_capacity(input_count.min(reader.remaining() / 41));
        for _ in 0..input_count {
            inputs.push(TransactionInput::read_from(reader)?);
        }

        let output_count = read_count(reader, "output")?;
        let mut outputs = Vec::with_capacity(output_count.min(reader.remaining() / 9));
        for _ in 0..output_count {
            outputs.push(TransactionOutput::read_from(reader)?);
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading lock time: {}", e))
        })?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize this transaction to raw wire bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(256);
        writer.write_u32_le(self.version);

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }

        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    /// Hex of [`Transaction::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Transaction ID
    // -----------------------------------------------------------------

    /// Double SHA-256 of the serialization, in internal byte order.
    pub fn tx_id(&self) -> [u8; 32] {
        sha256d(&self.to_bytes())
    }

    /// The txid as conventionally displayed: byte-reversed hex.
    pub fn tx_id_hex(&self) -> String {
        let mut id = self.tx_id();
        id.reverse();
        hex::encode(id)
    }

    // -----------------------------------------------------------------
    // Inputs and outputs
    // -----------------------------------------------------------------

    /// Append an input. Its index is the previous input count.
    pub fn add_input(&mut self, input: TransactionInput) {
        self.inputs.push(input);
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Append an output. Its index is the previous output count.
    pub fn add_output(&mut self, output: TransactionOutput) {
        self.outputs.push(output);
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Size of the serialized transaction in bytes.
    pub fn size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Add an input spending `vout` of the transaction with display-order
    /// txid `prev_tx_id`, recording the spent output's script and amount.
    ///
    /// # Arguments
    /// * `prev_tx_id` - Txid as displayed (byte-reversed hex).
    /// * `vout` - Output index within that transaction.
    /// * `prev_locking_script_hex` - The spent locking script; empty records
    ///   an empty script.
    /// * `satoshis` - The spent amount.
    ///
    /// # Returns
    /// `Ok(())`, or an error if the txid is not 32 bytes of hex or the
    /// script is not hex.
    pub fn add_input_from(
        &mut self,
        prev_tx_id: &str,
        vout: u32,
        prev_locking_script_hex: &str,
        satoshis: u64,
    ) -> Result<(), TransactionError> {
        let mut txid: [u8; 32] = hex::decode(prev_tx_id)
            .map_err(|e| TransactionError::SerializationError(format!("invalid txid hex: {}", e)))?
            .try_into()
            .map_err(|bytes: Vec<u8>| {
                TransactionError::SerializationError(format!(
                    "txid must be 32 bytes, got {}",
                    bytes.len()
                ))
            })?;
        txid.reverse();

        let locking_script = if prev_locking_script_hex.is_empty() {
            Script::new()
        } else {
            Script::from_hex(prev_locking_script_hex)?
        };

        let mut input = TransactionInput::new(txid, vout);
        input.set_source_output(Some(TransactionOutput::new(satoshis, locking_script)));
        self.inputs.push(input);
        Ok(())
    }

    /// The input at `index`, or `InputIndex` when out of range.
    pub fn input(&self, index: usize) -> Result<&TransactionInput, TransactionError> {
        self.inputs.get(index).ok_or(TransactionError::InputIndex {
            index,
            count: self.inputs.len(),
        })
    }

    // -----------------------------------------------------------------
    // Signature hash
    // -----------------------------------------------------------------

    /// Digest a signature over input `input_index` commits to, using the
    /// input's source output as scriptCode and amount.
    ///
    /// FORKID flags select the BIP143-style preimage; anything else the
    /// legacy transaction-copy digest.
    ///
    /// # Arguments
    /// * `input_index` - The input being signed.
    /// * `sighash_flag` - One sighash byte, e.g. `SIGHASH_ALL_FORKID`.
    ///
    /// # Returns
    /// The 32-byte digest to sign, or `InputIndex`, `MissingSourceOutput`
    /// or `InvalidSighashFlag`.
    pub fn calc_input_signature_hash(
        &self,
        input_index: usize,
        sighash_flag: u32,
    ) -> Result<[u8; 32], TransactionError> {
        let source_output = self
            .input(input_index)?
            .source_output()
            .ok_or(TransactionError::MissingSourceOutput(input_index))?;

        let script_code = source_output.locking_script.to_bytes();
        if SighashType::from(sighash_flag).has_forkid() {
            sighash::signature_hash(self, input_index, script_code, source_output.satoshis, sighash_flag)
        } else {
            debug!("legacy digest for input {} (flag 0x{:02x})", input_index, sighash_flag);
            sighash::legacy_signature_hash(self, input_index, script_code, sighash_flag)
        }
    }
}

fn read_count(reader: &mut WireReader, what: &str) -> Result<usize, TransactionError> {
    let count = reader.read_varint().map_err(|e| {
        TransactionError::SerializationError(format!("reading {} count: {}", what, e))
    })?;
    usize::try_from(count.value()).map_err(|_| {
        TransactionError::SerializationError(format!("{} count {} too large", what, count.value()))
    })
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Transaction {
    /// Display the transaction as its hex-encoded serialization.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
