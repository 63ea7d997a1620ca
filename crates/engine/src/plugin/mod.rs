//! Processor plugin contract.
//!
//! A processor plugin is everything the engine needs to know about one
//! instruction set. This module defines:
//! 1. **Descriptor:** Identity, register set, and memory layout (`ProcessorDescriptor`).
//! 2. **Contract:** The `ProcessorPlugin` trait with `compile`, `execute`, and an optional initial state.
//! 3. **Validation:** Explicit checks of descriptors and states, since the engine never trusts a plugin.
//! 4. **Registration:** The ordered, process-wide plugin registry (see [`registry`]).
//!
//! All implementors must be `Send + Sync` so a host can share one plugin between runs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::{
    CompileError, ContractViolation, ExecutionError, InstructionRecord, MachineState,
};

/// Ordered, process-wide registry of available plugins.
pub mod registry;

pub use registry::{PluginRegistry, RegistryError};

/// Memory configuration declared by a plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    /// Memory size in words; must be greater than zero.
    pub size: usize,
    /// Word size in bits; also the width of every instruction encoding.
    pub word_size: u32,
}

/// Identity and configuration of a processor plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorDescriptor {
    /// Unique identifier used for registration and selection.
    pub id: String,
    /// Display name; opaque to the engine.
    pub name: String,
    /// Declared register names, in display order.
    pub registers: Vec<String>,
    /// Declared memory layout.
    pub memory: MemoryLayout,
}

impl ProcessorDescriptor {
    /// Creates a descriptor.
    pub fn new<S: Into<String>>(
        id: impl Into<String>,
        name: impl Into<String>,
        registers: impl IntoIterator<Item = S>,
        memory: MemoryLayout,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            registers: registers.into_iter().map(Into::into).collect(),
            memory,
        }
    }

    /// Checks the descriptor itself.
    ///
    /// # Errors
    ///
    /// Returns a `ContractViolation` if the register set is empty or has
    /// duplicates, or the memory layout has a zero size or a word size
    /// outside `1..=64`.
    pub fn validate(&self) -> Result<(), ContractViolation> {
        if self.registers.is_empty() {
            return Err(ContractViolation::EmptyRegisterSet {
                plugin: self.id.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for name in &self.registers {
            if !seen.insert(name.as_str()) {
                return Err(ContractViolation::DuplicateRegister {
                    plugin: self.id.clone(),
                    register: name.clone(),
                });
            }
        }

        let MemoryLayout { size, word_size } = self.memory;
        if size == 0 || word_size == 0 || word_size > 64 {
            return Err(ContractViolation::InvalidMemoryLayout {
                plugin: self.id.clone(),
                size,
                word_size,
            });
        }
        Ok(())
    }

    /// Checks that `state` has exactly the declared registers and memory size.
    ///
    /// # Arguments
    ///
    /// * `state` - The state to check.
    /// * `context` - Where the state came from, used in the error message.
    ///
    /// # Errors
    ///
    /// Returns `RegisterSetMismatch` or `MemorySizeMismatch` on a shape mismatch.
    pub fn check_state(
        &self,
        state: &MachineState,
        context: &'static str,
    ) -> Result<(), ContractViolation> {
        let declared: BTreeSet<&str> = self.registers.iter().map(String::as_str).collect();
        let present: BTreeSet<&str> = state.registers().keys().map(String::as_str).collect();
        if declared != present {
            return Err(ContractViolation::RegisterSetMismatch {
                context,
                expected: declared.into_iter().map(str::to_owned).collect(),
                actual: present.into_iter().map(str::to_owned).collect(),
            });
        }

        if state.memory().len() != self.memory.size {
            return Err(ContractViolation::MemorySizeMismatch {
                context,
                expected: self.memory.size,
                actual: state.memory().len(),
            });
        }
        Ok(())
    }

    /// Returns the all-zero state for this descriptor.
    pub fn zeroed_state(&self) -> MachineState {
        MachineState::zeroed(&self.registers, self.memory.size)
    }
}

/// The capability set every processor plugin provides.
///
/// `compile` and `execute` must be pure: they may not depend on or change
/// any state outside their arguments. `execute` receives the current state
/// by shared reference and returns the next one; the engine keeps the old
/// state untouched in its history.
///
/// # Program counter convention
///
/// If `execute` returns a state whose program counter equals the input's,
/// the engine advances it by one. Any other value is taken as a jump and
/// honored verbatim.
pub trait ProcessorPlugin: Send + Sync {
    /// Returns the plugin's identity, register set, and memory layout.
    fn descriptor(&self) -> &ProcessorDescriptor;

    /// Translates source text into an ordered instruction sequence.
    ///
    /// # Errors
    ///
    /// Returns a `CompileError` if the source cannot be represented.
    fn compile(&self, source: &str) -> Result<Vec<InstructionRecord>, CompileError>;

    /// Executes one instruction and returns the resulting state.
    ///
    /// # Errors
    ///
    /// Returns an `ExecutionError` if the instruction cannot be interpreted.
    fn execute(
        &self,
        instruction: &InstructionRecord,
        state: &MachineState,
    ) -> Result<MachineState, ExecutionError>;

    /// Returns the state to use before the first step.
    ///
    /// When `None`, the engine uses [`ProcessorDescriptor::zeroed_state`].
    fn initial_state(&self) -> Option<MachineState> {
        None
    }
}
