//! Script chunks: the opcode-or-push units a script decodes into.
//!
//! Decoding keeps the push opcode that was actually used, so re-encoding a
//! decoded script reproduces it byte for byte. The interpreter relies on
//! that when it hashes script code.

use crate::opcodes::*;
use crate::ScriptError;

/// One decoded element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// Opcode byte. For direct pushes this is the pushed length.
    pub op: u8,
    /// Pushed bytes for OP_DATA_1..OP_PUSHDATA4 chunks.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// ASM token: hex for data pushes, the opcode name otherwise.
    pub fn to_asm_string(&self) -> String {
        match (&self.data, self.op) {
            (Some(data), OP_DATA_1..=OP_PUSHDATA4) => hex::encode(data),
            _ => opcode_to_string(self.op).to_string(),
        }
    }

    /// True when the chunk pushes data (OP_0 through OP_16 and OP_1NEGATE
    /// included).
    pub fn is_push(&self) -> bool {
        self.op <= OP_16 && self.op != OP_RESERVED
    }

    /// The pushed bytes, empty for opcodes that carry none.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Re-encode this chunk with the same opcode it was parsed from.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.data().len());
        self.append_to(&mut out);
        out
    }

    fn append_to(&self, out: &mut Vec<u8>) {
        out.push(self.op);
        let data = self.data();
        match self.op {
            OP_PUSHDATA1 => out.push(data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
            _ => {}
        }
        if self.op <= OP_PUSHDATA4 {
            out.extend_from_slice(data);
        }
    }
}

/// Split script bytes into chunks.
///
/// Every byte outside OP_DATA_1..OP_PUSHDATA4 is a bare opcode, OP_RETURN
/// included, so `encode_chunks(&decode_script(b)?) == b` for every
/// decodable script. A push that runs past the end yields
/// `ScriptError::DataTooSmall` with the offset of its opcode.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (chunk, next) = read_chunk(bytes, pos)?;
        chunks.push(chunk);
        pos = next;
    }
    Ok(chunks)
}

/// Read the chunk starting at `pos`, returning it with the offset after it.
pub fn read_chunk(bytes: &[u8], pos: usize) -> Result<(ScriptChunk, usize), ScriptError> {
    let op = bytes[pos];
    let (header, length) = match op {
        OP_DATA_1..=OP_DATA_75 => (1, op as usize),
        OP_PUSHDATA1 => (2, read_len(bytes, pos, 1)?),
        OP_PUSHDATA2 => (3, read_len(bytes, pos, 2)?),
        OP_PUSHDATA4 => (5, read_len(bytes, pos, 4)?),
        _ => return Ok((ScriptChunk { op, data: None }, pos + 1)),
    };
    let start = pos + header;
    let end = start
        .checked_add(length)
        .filter(|&end| end <= bytes.len())
        .ok_or(ScriptError::DataTooSmall(pos))?;
    let data = bytes[start..end].to_vec();
    Ok((ScriptChunk { op, data: Some(data) }, end))
}

/// Little-endian length field of `width` bytes following the opcode at `pos`.
fn read_len(bytes: &[u8], pos: usize, width: usize) -> Result<usize, ScriptError> {
    let field = bytes
        .get(pos + 1..pos + 1 + width)
        .ok_or(ScriptError::DataTooSmall(pos))?;
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(field);
    usize::try_from(u64::from_le_bytes(buf)).map_err(|_| ScriptError::DataTooBig)
}

/// Serialize chunks back into script bytes.
pub fn encode_chunks(chunks: &[ScriptChunk]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks {
        chunk.append_to(&mut out);
    }
    out
}

/// Smallest push header for a payload of `data_len` bytes.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    let prefix = match data_len {
        0..=75 => vec![data_len as u8],
        76..=0xff => vec![OP_PUSHDATA1, data_len as u8],
        0x100..=0xffff => {
            let mut p = vec![OP_PUSHDATA2];
            p.extend_from_slice(&(data_len as u16).to_le_bytes());
            p
        }
        _ => {
            let len = u32::try_from(data_len).map_err(|_| ScriptError::DataTooBig)?;
            let mut p = vec![OP_PUSHDATA4];
            p.extend_from_slice(&len.to_le_bytes());
            p
        }
    };
    Ok(prefix)
}
