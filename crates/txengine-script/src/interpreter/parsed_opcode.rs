//! Parsed opcode representation and the interpreter's script parser.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::opcode_table::{lookup, OpcodeInfo};
use crate::chunk::{read_chunk, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// One instruction of a script under evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOpcode {
    pub opcode: u8,
    /// Pushed bytes; empty for non-push opcodes.
    pub data: Vec<u8>,
}

impl From<ScriptChunk> for ParsedOpcode {
    fn from(chunk: ScriptChunk) -> Self {
        ParsedOpcode {
            opcode: chunk.op,
            data: chunk.data.unwrap_or_default(),
        }
    }
}

impl ParsedOpcode {
    pub fn info(&self) -> &'static OpcodeInfo {
        lookup(self.opcode)
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    /// IF/NOTIF/ELSE/ENDIF are evaluated even inside a skipped branch.
    pub fn is_conditional(&self) -> bool {
        matches!(self.opcode, OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF)
    }

    /// Check that a push uses the smallest possible encoding.
    pub fn enforce_minimum_data_push(&self) -> Result<(), InterpreterError> {
        let data_len = self.data.len();
        let expected = match (data_len, self.data.first()) {
            (0, _) => Some(("OP_0".to_string(), OP_0)),
            (1, Some(&v)) if (1..=16).contains(&v) => Some((format!("OP_{}", v), OP_1 + v - 1)),
            (1, Some(&0x81)) => Some(("OP_1NEGATE".to_string(), OP_1NEGATE)),
            _ => None,
        };
        if let Some((name, op)) = expected {
            if self.opcode != op {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::MinimalData,
                    format!(
                        "data push of {:02x?} encoded with opcode {} instead of {}",
                        self.data,
                        self.name(),
                        name
                    ),
                ));
            }
            return Ok(());
        }

        let minimal = minimal_push_opcode(data_len);
        if self.opcode != minimal {
            return Err(InterpreterError::new(
                InterpreterErrorCode::MinimalData,
                format!(
                    "data push of {} bytes encoded with opcode {} instead of {}",
                    data_len,
                    self.name(),
                    lookup(minimal).name
                ),
            ));
        }
        Ok(())
    }

    /// True when this instruction is exactly the push a signer would emit for
    /// `data`, which is what signature removal from the scriptCode matches.
    pub fn is_push_of(&self, data: &[u8]) -> bool {
        self.opcode <= OP_PUSHDATA4
            && self.data == data
            && self.opcode == minimal_push_opcode(data.len())
    }

    /// Serialize back to script bytes with the original push width.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + self.data.len());
        self.append_to(&mut out);
        out
    }

    pub fn append_to(&self, out: &mut Vec<u8>) {
        out.push(self.opcode);
        match self.opcode {
            OP_PUSHDATA1 => out.push(self.data.len() as u8),
            OP_PUSHDATA2 => out.extend_from_slice(&(self.data.len() as u16).to_le_bytes()),
            OP_PUSHDATA4 => out.extend_from_slice(&(self.data.len() as u32).to_le_bytes()),
            _ => {}
        }
        if self.opcode <= OP_PUSHDATA4 {
            out.extend_from_slice(&self.data);
        }
    }
}

/// Direct-length or PUSHDATA opcode a plain push of `len` bytes uses.
fn minimal_push_opcode(len: usize) -> u8 {
    match len {
        0..=75 => len as u8,
        76..=0xff => OP_PUSHDATA1,
        0x100..=0xffff => OP_PUSHDATA2,
        _ => OP_PUSHDATA4,
    }
}

pub type ParsedScript = Vec<ParsedOpcode>;

/// True when every instruction is a push (OP_RESERVED counts, as in consensus).
pub fn is_push_only(script: &[ParsedOpcode]) -> bool {
    script.iter().all(|op| op.opcode <= OP_16)
}

/// Parse raw script bytes. A push that runs past the end is `MalformedPush`.
pub fn parse_script(bytes: &[u8]) -> Result<ParsedScript, InterpreterError> {
    let mut parsed = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (chunk, next) = read_chunk(bytes, pos).map_err(|e| match e {
            ScriptError::DataTooSmall(at) => InterpreterError::new(
                InterpreterErrorCode::MalformedPush,
                format!("push at offset {} exceeds the script length {}", at, bytes.len()),
            ),
            other => InterpreterError::new(InterpreterErrorCode::MalformedPush, other.to_string()),
        })?;
        parsed.push(ParsedOpcode::from(chunk));
        pos = next;
    }
    Ok(parsed)
}

/// Serialize instructions back to script bytes.
pub fn unparse(script: &[ParsedOpcode]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in script {
        op.append_to(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(opcode: u8, data: &[u8]) -> ParsedOpcode {
        ParsedOpcode {
            opcode,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_parse_round_trip() {
        let bytes = hex::decode("4c0201024d0100ff4e0200000000010076a96a00").unwrap();
        let parsed = parse_script(&bytes).unwrap();
        assert_eq!(parsed.len(), 8);
        assert_eq!(parsed[0].data, vec![1, 2]);
        assert_eq!(parsed[6].opcode, OP_RETURN);
        assert_eq!(parsed[7].opcode, OP_0);
        assert_eq!(unparse(&parsed), bytes);
    }

    #[test]
    fn test_parse_truncated_push() {
        for hex_str in ["4c", "4c05aa", "4d01", "4e010000", "05aabb"] {
            let bytes = hex::decode(hex_str).unwrap();
            let err = parse_script(&bytes).unwrap_err();
            assert_eq!(err.code, InterpreterErrorCode::MalformedPush, "{}", hex_str);
        }
    }

    #[test]
    fn test_enforce_minimum_data_push() {
        assert!(push(OP_0, &[]).enforce_minimum_data_push().is_ok());
        assert!(push(OP_PUSHDATA1, &[]).enforce_minimum_data_push().is_err());
        assert!(push(OP_5, &[5]).enforce_minimum_data_push().is_ok());
        assert!(push(OP_DATA_1, &[5]).enforce_minimum_data_push().is_err());
        assert!(push(OP_DATA_1, &[0x81]).enforce_minimum_data_push().is_err());
        assert!(push(OP_DATA_1, &[0x11]).enforce_minimum_data_push().is_ok());
        assert!(push(OP_PUSHDATA1, &[7; 75]).enforce_minimum_data_push().is_err());
        assert!(push(OP_PUSHDATA1, &[7; 76]).enforce_minimum_data_push().is_ok());
        assert!(push(OP_PUSHDATA2, &[7; 255]).enforce_minimum_data_push().is_err());
        assert!(push(OP_PUSHDATA2, &[7; 256]).enforce_minimum_data_push().is_ok());
    }

    #[test]
    fn test_is_push_of() {
        let sig = [0x30u8; 71];
        assert!(push(71, &sig).is_push_of(&sig));
        assert!(!push(OP_PUSHDATA1, &sig).is_push_of(&sig));
        assert!(!push(71, &sig).is_push_of(&sig[..70]));
        assert!(!push(OP_CHECKSIG, &[]).is_push_of(&[]));
    }

    #[test]
    fn test_is_push_only() {
        let script = parse_script(&[OP_1, OP_DATA_1, 0xaa, OP_16, OP_RESERVED]).unwrap();
        assert!(is_push_only(&script));
        let script = parse_script(&[OP_1, OP_DUP]).unwrap();
        assert!(!is_push_only(&script));
    }
}
