//! Resource limit profiles for the interpreter.

/// Non-push opcodes per script under consensus limits.
pub const MAX_OPS: usize = 201;
/// Combined main and alt stack depth.
pub const MAX_STACK_SIZE: usize = 1000;
/// Bytes per script.
pub const MAX_SCRIPT_SIZE: usize = 10_000;
/// Largest element that may be pushed or produced.
pub const MAX_ELEMENT_SIZE: usize = 520;
/// Byte length of numeric operands.
pub const MAX_NUMBER_LENGTH: usize = 4;
pub const MAX_PUB_KEYS_PER_MULTISIG: usize = 20;

/// Script execution limits.
///
/// Every bound the executor enforces lives here. `Config::consensus()` is
/// the default; `Config::relaxed()` loosens every bound for callers that
/// evaluate large scripts off-chain. Individual fields are adjusted with the
/// `with_*` builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    max_ops: usize,
    max_stack_size: usize,
    max_script_size: usize,
    max_element_size: usize,
    max_number_length: usize,
    max_pub_keys_per_multisig: usize,
}

impl Config {
    /// Consensus limits: 201 ops, 1000 stack items, 10 000-byte scripts,
    /// 520-byte elements, 4-byte numbers and 20 keys per multisig.
    ///
    /// # Returns
    /// The profile `Engine::new()` runs with.
    pub const fn consensus() -> Self {
        Config {
            max_ops: MAX_OPS,
            max_stack_size: MAX_STACK_SIZE,
            max_script_size: MAX_SCRIPT_SIZE,
            max_element_size: MAX_ELEMENT_SIZE,
            max_number_length: MAX_NUMBER_LENGTH,
            max_pub_keys_per_multisig: MAX_PUB_KEYS_PER_MULTISIG,
        }
    }

    /// A looser profile for scripts evaluated off-chain.
    ///
    /// # Returns
    /// A `Config` whose every bound is at least the consensus one.
    pub const fn relaxed() -> Self {
        Config {
            max_ops: 500_000,
            max_stack_size: 100_000,
            max_script_size: 10_000_000,
            max_element_size: 1_000_000,
            max_number_length: 750_000,
            max_pub_keys_per_multisig: i32::MAX as usize,
        }
    }

    /// Override the non-push opcode budget.
    ///
    /// # Arguments
    /// * `n` - Opcodes allowed per script; one more fails with
    ///   `ResourceLimitExceeded`.
    pub fn with_max_ops(mut self, n: usize) -> Self {
        self.max_ops = n;
        self
    }

    /// Override the combined main and alt stack depth.
    pub fn with_max_stack_size(mut self, n: usize) -> Self {
        self.max_stack_size = n;
        self
    }

    /// Override the largest script, in bytes, the engine will run.
    pub fn with_max_script_size(mut self, n: usize) -> Self {
        self.max_script_size = n;
        self
    }

    /// Override the largest stack element, in bytes.
    pub fn with_max_element_size(mut self, n: usize) -> Self {
        self.max_element_size = n;
        self
    }

    /// Override the byte length accepted for numeric operands.
    pub fn with_max_number_length(mut self, n: usize) -> Self {
        self.max_number_length = n;
        self
    }

    /// Override the key count CHECKMULTISIG accepts.
    pub fn with_max_pub_keys_per_multisig(mut self, n: usize) -> Self {
        self.max_pub_keys_per_multisig = n;
        self
    }

    // Accessors.

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }

    pub fn max_script_size(&self) -> usize {
        self.max_script_size
    }

    pub fn max_element_size(&self) -> usize {
        self.max_element_size
    }

    pub fn max_number_length(&self) -> usize {
        self.max_number_length
    }

    pub fn max_pub_keys_per_multisig(&self) -> usize {
        self.max_pub_keys_per_multisig
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::consensus()
    }
}
