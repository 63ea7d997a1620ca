//! Compilation and step execution.
//!
//! Turns source text into a validated program and drives a plugin through
//! it one instruction at a time, keeping a rewindable history of states.

pub mod compiler;
pub mod controller;
pub mod history;

pub use compiler::{CompiledProgram, compile_program};
pub use controller::{
    CancelHandle, HaltCause, Phase, RunOutcome, RunProgress, StepController, StepOutcome, Stepped,
};
pub use history::{History, HistoryEntry};
