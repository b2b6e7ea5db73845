//! Script verification flags (bitmask).

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Script verification flags controlling interpreter behavior.
///
/// Built fresh per verification call and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    pub const NONE: ScriptFlags = ScriptFlags(0);
    /// Evaluate pay-to-script-hash redeem scripts.
    pub const P2SH: ScriptFlags = ScriptFlags(1 << 0);
    /// Strict sighash byte, DER and public key encodings.
    pub const STRICT_ENCODING: ScriptFlags = ScriptFlags(1 << 1);
    pub const VERIFY_DER_SIGNATURES: ScriptFlags = ScriptFlags(1 << 2);
    pub const VERIFY_LOW_S: ScriptFlags = ScriptFlags(1 << 3);
    pub const VERIFY_MINIMAL_DATA: ScriptFlags = ScriptFlags(1 << 4);
    /// Exactly one element may remain. Requires `P2SH`.
    pub const VERIFY_CLEAN_STACK: ScriptFlags = ScriptFlags(1 << 5);
    pub const VERIFY_SIG_PUSH_ONLY: ScriptFlags = ScriptFlags(1 << 6);
    pub const VERIFY_NULL_DUMMY: ScriptFlags = ScriptFlags(1 << 7);
    pub const VERIFY_NULL_FAIL: ScriptFlags = ScriptFlags(1 << 8);
    pub const VERIFY_MINIMAL_IF: ScriptFlags = ScriptFlags(1 << 9);
    pub const DISCOURAGE_UPGRADABLE_NOPS: ScriptFlags = ScriptFlags(1 << 10);
    pub const VERIFY_CHECKLOCKTIMEVERIFY: ScriptFlags = ScriptFlags(1 << 11);
    pub const VERIFY_CHECKSEQUENCEVERIFY: ScriptFlags = ScriptFlags(1 << 12);
    /// FORKID digests. Implies `STRICT_ENCODING`.
    pub const ENABLE_SIGHASH_FORKID: ScriptFlags = ScriptFlags(1 << 13);
    /// CAT, SPLIT, NUM2BIN, BIN2NUM, AND, OR, XOR, DIV, MOD.
    pub const ENABLE_EXTENDED_OPS_A: ScriptFlags = ScriptFlags(1 << 14);
    /// INVERT, MUL, LSHIFT, RSHIFT.
    pub const ENABLE_EXTENDED_OPS_B: ScriptFlags = ScriptFlags(1 << 15);

    /// The policy set used for relaying ordinary FORKID transactions.
    pub const STANDARD: ScriptFlags = ScriptFlags(
        Self::P2SH.0
            | Self::STRICT_ENCODING.0
            | Self::VERIFY_DER_SIGNATURES.0
            | Self::VERIFY_LOW_S.0
            | Self::VERIFY_MINIMAL_DATA.0
            | Self::VERIFY_CLEAN_STACK.0
            | Self::VERIFY_SIG_PUSH_ONLY.0
            | Self::VERIFY_NULL_DUMMY.0
            | Self::VERIFY_NULL_FAIL.0
            | Self::VERIFY_MINIMAL_IF.0
            | Self::DISCOURAGE_UPGRADABLE_NOPS.0
            | Self::VERIFY_CHECKLOCKTIMEVERIFY.0
            | Self::VERIFY_CHECKSEQUENCEVERIFY.0
            | Self::ENABLE_SIGHASH_FORKID.0,
    );

    /// Every defined flag, lowest bit first.
    pub const ALL: [ScriptFlags; 16] = [
        Self::P2SH,
        Self::STRICT_ENCODING,
        Self::VERIFY_DER_SIGNATURES,
        Self::VERIFY_LOW_S,
        Self::VERIFY_MINIMAL_DATA,
        Self::VERIFY_CLEAN_STACK,
        Self::VERIFY_SIG_PUSH_ONLY,
        Self::VERIFY_NULL_DUMMY,
        Self::VERIFY_NULL_FAIL,
        Self::VERIFY_MINIMAL_IF,
        Self::DISCOURAGE_UPGRADABLE_NOPS,
        Self::VERIFY_CHECKLOCKTIMEVERIFY,
        Self::VERIFY_CHECKSEQUENCEVERIFY,
        Self::ENABLE_SIGHASH_FORKID,
        Self::ENABLE_EXTENDED_OPS_A,
        Self::ENABLE_EXTENDED_OPS_B,
    ];

    pub fn has_flag(self, flag: ScriptFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn has_any(self, flags: &[ScriptFlags]) -> bool {
        flags.iter().any(|f| self.has_flag(*f))
    }

    pub fn add_flag(&mut self, flag: ScriptFlags) {
        self.0 |= flag.0;
    }
}

impl BitOr for ScriptFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ScriptFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScriptFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ScriptFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ScriptFlags(self.0 & rhs.0)
    }
}
