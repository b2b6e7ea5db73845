/// Script parsing and execution for txengine.
///
/// Provides the Script type, opcode definitions, script chunk parsing and
/// the flag-gated script interpreter.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod interpreter;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use chunk::ScriptChunk;
