//! The `Script` byte-string type shared by locking and unlocking scripts.

use std::fmt;

use crate::chunk::{decode_script, encode_chunks, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// Raw script bytes. Parsing into chunks happens on demand, so a `Script`
/// can hold bytes that do not decode; the interpreter reports those when it
/// reaches them.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        Ok(Script(hex::decode(hex_str)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Build a script by serializing chunks, keeping each chunk's opcode.
    pub fn from_chunks(chunks: &[ScriptChunk]) -> Self {
        Script(encode_chunks(chunks))
    }

    /// Parse space-separated ASM. Opcode names map to their byte; any other
    /// token must be hex and becomes a minimal push.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                Some(op) => script.0.push(op),
                None => {
                    let data = hex::decode(token)
                        .map_err(|_| ScriptError::InvalidAsmToken(token.to_string()))?;
                    script.append_push_data(&data)?;
                }
            }
        }
        Ok(script)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// ASM rendering: pushes as hex, opcodes by name. Bytes that do not
    /// decode render as an empty string.
    pub fn to_asm(&self) -> String {
        match decode_script(&self.0) {
            Ok(chunks) => chunks
                .iter()
                .map(ScriptChunk::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn is_p2pkh(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [OP_DUP, OP_HASH160, OP_DATA_20, .., OP_EQUALVERIFY, OP_CHECKSIG] if self.0.len() == 25
        )
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`, the exact pattern that triggers
    /// redeem-script evaluation.
    pub fn is_p2sh(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [OP_HASH160, OP_DATA_20, .., OP_EQUAL] if self.0.len() == 23
        )
    }

    /// True when every chunk is a push. A script that does not parse is not
    /// push-only.
    pub fn is_push_only(&self) -> bool {
        self.chunks()
            .map(|chunks| chunks.iter().all(ScriptChunk::is_push))
            .unwrap_or(false)
    }

    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    /// Append `data` behind its smallest push header.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append bare opcodes. Push opcodes are refused since they need a
    /// payload.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(&op) = opcodes
            .iter()
            .find(|&&op| (OP_DATA_1..=OP_PUSHDATA4).contains(&op))
        {
            return Err(ScriptError::PushOpcodeNotAllowed(
                opcode_to_string(op).to_string(),
            ));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
