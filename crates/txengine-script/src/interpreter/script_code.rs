//! The portion of the executing script that signatures commit to.

use super::parsed_opcode::ParsedOpcode;

/// A read-only view of the executing script starting after the most recently
/// executed OP_CODESEPARATOR.
///
/// The view never mutates the script being executed. Signature removal for
/// legacy digests happens while serializing.
#[derive(Debug, Clone, Copy)]
pub struct ScriptCode<'a> {
    ops: &'a [ParsedOpcode],
}

impl<'a> ScriptCode<'a> {
    /// `start` is the index of the first instruction after the separator.
    pub fn new(script: &'a [ParsedOpcode], start: usize) -> Self {
        ScriptCode {
            ops: script.get(start..).unwrap_or(&[]),
        }
    }

    pub fn ops(&self) -> &'a [ParsedOpcode] {
        self.ops
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize(&[])
    }

    /// Serialize with every exact push of one of `sigs` left out.
    pub fn without_signatures(&self, sigs: &[&[u8]]) -> Vec<u8> {
        self.serialize(sigs)
    }

    fn serialize(&self, sigs: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for op in self.ops {
            if sigs.iter().any(|sig| !sig.is_empty() && op.is_push_of(sig)) {
                continue;
            }
            op.append_to(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::parsed_opcode::parse_script;
    use crate::opcodes::*;

    #[test]
    fn test_view_after_separator() {
        let script = parse_script(&[OP_1, OP_CODESEPARATOR, OP_DUP, OP_DROP]).unwrap();
        assert_eq!(ScriptCode::new(&script, 0).to_bytes(), vec![OP_1, OP_CODESEPARATOR, OP_DUP, OP_DROP]);
        assert_eq!(ScriptCode::new(&script, 2).to_bytes(), vec![OP_DUP, OP_DROP]);
        assert!(ScriptCode::new(&script, 9).to_bytes().is_empty());
    }

    #[test]
    fn test_signature_removal_leaves_script_untouched() {
        let sig = [0xab; 10];
        let mut bytes = vec![10];
        bytes.extend_from_slice(&sig);
        bytes.push(OP_DROP);
        bytes.push(OP_PUSHDATA1);
        bytes.push(10);
        bytes.extend_from_slice(&sig);
        let script = parse_script(&bytes).unwrap();
        let code = ScriptCode::new(&script, 0);

        let stripped = code.without_signatures(&[&sig]);
        let mut expected = vec![OP_DROP, OP_PUSHDATA1, 10];
        expected.extend_from_slice(&sig);
        assert_eq!(stripped, expected);
        assert_eq!(code.to_bytes(), bytes);
        assert_eq!(code.ops().len(), 3);
    }
}
