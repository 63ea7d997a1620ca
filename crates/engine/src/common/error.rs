//! Error taxonomy for the compile-and-step engine.
//!
//! This module defines every failure the engine can report. It provides:
//! 1. **Plugin errors:** `CompileError` and `ExecutionError`, raised by a processor plugin.
//! 2. **Contract errors:** `ContractViolation`, raised by the engine when a plugin breaks its contract.
//! 3. **Engine errors:** `EngineError`, the single error type returned by controller transitions.
//!
//! Normal termination (`ProgramCounterOutOfBounds`) and the step guard
//! (`StepLimitExceeded`) are halt causes, not errors; see [`crate::sim::HaltCause`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A position in the source text, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SourcePos {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source text is not compilable under a plugin's rules.
///
/// Reported by [`ProcessorPlugin::compile`](crate::plugin::ProcessorPlugin::compile).
/// The engine surfaces it unchanged and never attempts partial recovery.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
pub struct CompileError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Location of the problem, when the plugin can determine it.
    pub pos: Option<SourcePos>,
}

impl CompileError {
    /// Creates a compile error without a source location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos: None,
        }
    }

    /// Creates a compile error pointing at `line`/`column` (both 1-based).
    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            pos: Some(SourcePos { line, column }),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A plugin could not interpret an instruction during `execute`.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ExecutionError {
    /// Human-readable description of the fault.
    pub message: String,
}

impl ExecutionError {
    /// Creates an execution error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A plugin produced output or configuration that breaks the plugin contract.
///
/// These indicate a broken plugin rather than bad user input, so they are
/// always surfaced and never coerced into a valid shape.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
pub enum ContractViolation {
    /// The plugin declares no registers.
    #[error("plugin '{plugin}' declares an empty register set")]
    EmptyRegisterSet {
        /// Plugin identifier.
        plugin: String,
    },

    /// The same register name is declared twice.
    #[error("plugin '{plugin}' declares register '{register}' more than once")]
    DuplicateRegister {
        /// Plugin identifier.
        plugin: String,
        /// The repeated register name.
        register: String,
    },

    /// Memory size or word size is zero, or the word size is wider than 64 bits.
    #[error("plugin '{plugin}' declares invalid memory layout (size {size} words, word size {word_size} bits)")]
    InvalidMemoryLayout {
        /// Plugin identifier.
        plugin: String,
        /// Declared size in words.
        size: usize,
        /// Declared word size in bits.
        word_size: u32,
    },

    /// An encoding's width differs from the declared word size.
    #[error("instruction {index} encoding has {actual} bits, expected {expected}")]
    EncodingWidth {
        /// Position of the record in the compiled sequence.
        index: usize,
        /// Declared word size.
        expected: u32,
        /// Length of the encoding string.
        actual: usize,
    },

    /// An encoding contains characters other than `'0'` and `'1'`.
    #[error("instruction {index} encoding '{encoding}' is not a bit string")]
    EncodingNotBinary {
        /// Position of the record in the compiled sequence.
        index: usize,
        /// The offending encoding.
        encoding: String,
    },

    /// Instruction addresses go backwards.
    #[error("instruction {index} address {address:#x} precedes previous address {previous:#x}")]
    AddressOrder {
        /// Position of the record in the compiled sequence.
        index: usize,
        /// Address of the record.
        address: u64,
        /// Address of the preceding record.
        previous: u64,
    },

    /// A machine state's register keys differ from the declared register set.
    #[error("{context} state registers {actual:?} do not match declared set {expected:?}")]
    RegisterSetMismatch {
        /// Where the state came from (`initial` or `execute`).
        context: &'static str,
        /// Declared register names, sorted.
        expected: Vec<String>,
        /// Register names present in the state, sorted.
        actual: Vec<String>,
    },

    /// A machine state's memory length differs from the declared size.
    #[error("{context} state memory has {actual} words, expected {expected}")]
    MemorySizeMismatch {
        /// Where the state came from (`initial` or `execute`).
        context: &'static str,
        /// Declared memory size in words.
        expected: usize,
        /// Memory length of the state.
        actual: usize,
    },

    /// The declared initial state does not start at program counter 0.
    #[error("initial state program counter is {0}, expected 0")]
    InitialProgramCounter(usize),
}

/// Error returned by controller transitions and the compilation stage.
///
/// A transition that returns `Err` has left the controller exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The plugin rejected the source text.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// The plugin broke its contract.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// The operation needs a loaded program.
    #[error("no program loaded")]
    NotLoaded,

    /// `rewind_to` was asked for a step outside the active timeline.
    #[error("step {requested} is outside history (last step {last})")]
    StepOutOfRange {
        /// Requested step index.
        requested: usize,
        /// Last valid step index.
        last: usize,
    },
}

/// Convenience alias used across the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
