//! Plugin-driven compile-and-step processor simulator.
//!
//! This crate compiles a small source program for a pluggable processor and
//! steps through it one instruction at a time, keeping every machine state:
//! 1. **Plugins:** The `ProcessorPlugin` contract and an ordered plugin registry.
//! 2. **Compilation:** Running a plugin's compiler and validating what it returns.
//! 3. **Stepping:** The `StepController` state machine with run, reset, and rewind.
//! 4. **History:** An append-only log of immutable snapshots for viewers and rewind.
//! 5. **Reference ISA:** The `mini8` teaching processor, plus run statistics and configuration.
//!
//! This is a functional simulator: one instruction per step, no timing model.

/// Common types (instruction records, machine states, addresses, errors).
pub mod common;
/// Engine configuration (step cap, yield batch size, tracing).
pub mod config;
/// Built-in reference processors.
pub mod isa;
/// Processor plugin contract and registry.
pub mod plugin;
/// Compilation stage, step controller, and history.
pub mod sim;
/// Run statistics derived from history.
pub mod stats;

/// Root configuration type; use `EngineConfig::default()` or deserialize from JSON.
pub use crate::config::EngineConfig;
/// Contract every processor plugin implements.
pub use crate::plugin::ProcessorPlugin;
/// The step-execution state machine.
pub use crate::sim::StepController;
