//! Common types shared by every part of the engine.
//!
//! This module provides the plain data the engine passes around:
//! 1. **Instruction Records:** Compiled instructions with their bit-string encodings.
//! 2. **Machine State:** Immutable snapshots of registers, memory, and program counter.
//! 3. **Addresses:** Hex rendering of instruction addresses for viewers.
//! 4. **Error Handling:** The compile, execution, contract, and engine error types.

/// Instruction address rendering.
pub mod addr;

/// Error types for plugins and the engine.
pub mod error;

/// Instruction records and bit-string helpers.
pub mod instruction;

/// Machine state snapshots and diffs.
pub mod state;

pub use addr::{address_width, format_address};
pub use error::{CompileError, ContractViolation, EngineError, ExecutionError, SourcePos};
pub use instruction::{InstructionRecord, to_bit_string};
pub use state::{MachineState, MemoryChange, RegisterChange, StateDiff};
