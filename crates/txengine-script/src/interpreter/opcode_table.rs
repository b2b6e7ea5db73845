//! Static per-opcode metadata driving dispatch and gating.
//!
//! The table is computed at compile time and never mutated. Each of the 256
//! byte values maps to a name, a handler category, the flag gate that
//! enables it and the number of main-stack items it needs.

use crate::opcodes::*;

/// Handler group an opcode is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeCategory {
    Push,
    FlowControl,
    Stack,
    Splice,
    Bitwise,
    Arithmetic,
    Crypto,
    LockTime,
    Nop,
    Reserved,
    Disabled,
    Invalid,
}

/// What has to hold for an opcode to be allowed in a script at all.
///
/// Gates are checked for every opcode the interpreter walks over, including
/// those in branches that are not executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Always,
    ExtendedA,
    ExtendedB,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub name: &'static str,
    pub category: OpcodeCategory,
    pub gate: Gate,
    /// Main-stack items that must be present before the opcode executes.
    pub arity: u8,
}

const fn entry(op: u8, category: OpcodeCategory, gate: Gate, arity: u8) -> OpcodeInfo {
    OpcodeInfo {
        name: opcode_to_string(op),
        category,
        gate,
        arity,
    }
}

const fn info(op: u8) -> OpcodeInfo {
    use Gate::*;
    use OpcodeCategory::*;
    match op {
        OP_0..=OP_1NEGATE | OP_1..=OP_16 => entry(op, Push, Always, 0),
        OP_RESERVED | OP_VER | OP_RESERVED1 | OP_RESERVED2 => entry(op, Reserved, Always, 0),
        OP_VERIF | OP_VERNOTIF => entry(op, Reserved, Never, 0),
        OP_NOP | OP_NOP1 | OP_NOP4..=OP_NOP10 => entry(op, Nop, Always, 0),

        OP_IF | OP_NOTIF | OP_VERIFY => entry(op, FlowControl, Always, 1),
        OP_ELSE | OP_ENDIF | OP_RETURN => entry(op, FlowControl, Always, 0),

        OP_FROMALTSTACK | OP_DEPTH => entry(op, Stack, Always, 0),
        OP_TOALTSTACK | OP_IFDUP | OP_DROP | OP_DUP | OP_PICK | OP_ROLL => {
            entry(op, Stack, Always, 1)
        }
        OP_2DROP | OP_2DUP | OP_NIP | OP_OVER | OP_SWAP | OP_TUCK => entry(op, Stack, Always, 2),
        OP_3DUP | OP_ROT => entry(op, Stack, Always, 3),
        OP_2OVER | OP_2SWAP => entry(op, Stack, Always, 4),
        OP_2ROT => entry(op, Stack, Always, 6),

        OP_CAT | OP_SPLIT | OP_NUM2BIN => entry(op, Splice, ExtendedA, 2),
        OP_BIN2NUM => entry(op, Splice, ExtendedA, 1),
        OP_SIZE => entry(op, Splice, Always, 1),

        OP_INVERT => entry(op, Bitwise, ExtendedB, 1),
        OP_AND | OP_OR | OP_XOR => entry(op, Bitwise, ExtendedA, 2),
        OP_EQUAL | OP_EQUALVERIFY => entry(op, Bitwise, Always, 2),

        OP_2MUL | OP_2DIV => entry(op, Disabled, Never, 1),
        OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
            entry(op, Arithmetic, Always, 1)
        }
        OP_MUL | OP_LSHIFT | OP_RSHIFT => entry(op, Arithmetic, ExtendedB, 2),
        OP_DIV | OP_MOD => entry(op, Arithmetic, ExtendedA, 2),
        OP_ADD | OP_SUB | OP_BOOLAND..=OP_MAX => entry(op, Arithmetic, Always, 2),
        OP_WITHIN => entry(op, Arithmetic, Always, 3),

        OP_RIPEMD160..=OP_HASH256 => entry(op, Crypto, Always, 1),
        OP_CODESEPARATOR => entry(op, Crypto, Always, 0),
        OP_CHECKSIG | OP_CHECKSIGVERIFY => entry(op, Crypto, Always, 2),
        OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => entry(op, Crypto, Always, 1),

        // Both read their operand only when their flag turns them on.
        OP_CHECKLOCKTIMEVERIFY | OP_CHECKSEQUENCEVERIFY => entry(op, LockTime, Always, 0),

        _ => entry(op, Invalid, Always, 0),
    }
}

const fn build_table() -> [OpcodeInfo; 256] {
    let mut table = [entry(OP_INVALIDOPCODE, OpcodeCategory::Invalid, Gate::Always, 0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = info(i as u8);
        i += 1;
    }
    table
}

/// Metadata for every byte value, indexed by opcode.
pub static OPCODE_TABLE: [OpcodeInfo; 256] = build_table();

/// Table entry for `op`.
pub fn lookup(op: u8) -> &'static OpcodeInfo {
    &OPCODE_TABLE[op as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_match_opcode_names() {
        for op in 0..=255u8 {
            assert_eq!(lookup(op).name, opcode_to_string(op));
        }
    }

    #[test]
    fn test_gates() {
        for op in [OP_CAT, OP_SPLIT, OP_NUM2BIN, OP_BIN2NUM, OP_AND, OP_OR, OP_XOR, OP_DIV, OP_MOD] {
            assert_eq!(lookup(op).gate, Gate::ExtendedA, "{}", lookup(op).name);
        }
        for op in [OP_INVERT, OP_MUL, OP_LSHIFT, OP_RSHIFT] {
            assert_eq!(lookup(op).gate, Gate::ExtendedB, "{}", lookup(op).name);
        }
        for op in [OP_2MUL, OP_2DIV] {
            assert_eq!(lookup(op).category, OpcodeCategory::Disabled);
            assert_eq!(lookup(op).gate, Gate::Never);
        }
        assert_eq!(lookup(OP_VERIF).gate, Gate::Never);
        assert_eq!(lookup(OP_ADD).gate, Gate::Always);
    }

    #[test]
    fn test_categories() {
        assert_eq!(lookup(OP_0).category, OpcodeCategory::Push);
        assert_eq!(lookup(OP_PUSHDATA4).category, OpcodeCategory::Push);
        assert_eq!(lookup(OP_1NEGATE).category, OpcodeCategory::Push);
        assert_eq!(lookup(OP_RESERVED).category, OpcodeCategory::Reserved);
        assert_eq!(lookup(OP_16).category, OpcodeCategory::Push);
        assert_eq!(lookup(OP_NOP).category, OpcodeCategory::Nop);
        assert_eq!(lookup(OP_NOP10).category, OpcodeCategory::Nop);
        assert_eq!(lookup(OP_CHECKLOCKTIMEVERIFY).category, OpcodeCategory::LockTime);
        assert_eq!(lookup(OP_WITHIN).category, OpcodeCategory::Arithmetic);
        assert_eq!(lookup(OP_SIZE).category, OpcodeCategory::Splice);
        for op in OP_UNKNOWN_FIRST..=OP_INVALIDOPCODE {
            assert_eq!(lookup(op).category, OpcodeCategory::Invalid);
        }
    }

    #[test]
    fn test_arity() {
        assert_eq!(lookup(OP_2ROT).arity, 6);
        assert_eq!(lookup(OP_WITHIN).arity, 3);
        assert_eq!(lookup(OP_CHECKSIG).arity, 2);
        assert_eq!(lookup(OP_DEPTH).arity, 0);
    }
}
