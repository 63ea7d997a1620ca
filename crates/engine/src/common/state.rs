//! Machine state snapshots.
//!
//! A `MachineState` is a value: every step produces a fresh instance and
//! nothing mutates a state once it has been recorded. This module provides:
//! 1. **Snapshot:** Registers, memory, and program counter at one step boundary.
//! 2. **Derivation:** `with_*` builders that consume a state and return the next one.
//! 3. **Diffing:** `StateDiff`, the observable change between two snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of registers, memory, and program counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    registers: BTreeMap<String, i64>,
    memory: Vec<i64>,
    program_counter: usize,
}

impl MachineState {
    /// Creates a state from its parts.
    ///
    /// # Arguments
    ///
    /// * `registers` - Register name to value mapping.
    /// * `memory` - Memory words, index 0 first.
    /// * `program_counter` - Index into the compiled instruction sequence.
    pub fn new(
        registers: BTreeMap<String, i64>,
        memory: Vec<i64>,
        program_counter: usize,
    ) -> Self {
        Self {
            registers,
            memory,
            program_counter,
        }
    }

    /// Creates the all-zero state for a register set and memory size, with `program_counter = 0`.
    pub fn zeroed<S: AsRef<str>>(registers: &[S], memory_size: usize) -> Self {
        Self {
            registers: registers
                .iter()
                .map(|name| (name.as_ref().to_owned(), 0))
                .collect(),
            memory: vec![0; memory_size],
            program_counter: 0,
        }
    }

    /// Returns the value of register `name`, or `None` if it is not declared.
    pub fn register(&self, name: &str) -> Option<i64> {
        self.registers.get(name).copied()
    }

    /// Returns all registers, ordered by name.
    pub fn registers(&self) -> &BTreeMap<String, i64> {
        &self.registers
    }

    /// Returns the memory words.
    pub fn memory(&self) -> &[i64] {
        &self.memory
    }

    /// Returns the word at `index`, or `None` if out of range.
    pub fn memory_at(&self, index: usize) -> Option<i64> {
        self.memory.get(index).copied()
    }

    /// Returns the program counter.
    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    /// Returns this state with register `name` set to `value`.
    ///
    /// Setting an undeclared register adds it; the engine rejects such a
    /// state as a contract violation when it comes back from `execute`.
    #[must_use]
    pub fn with_register(mut self, name: &str, value: i64) -> Self {
        match self.registers.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                let _ = self.registers.insert(name.to_owned(), value);
            }
        }
        self
    }

    /// Returns this state with memory word `index` set to `value`.
    ///
    /// Writes outside the memory are ignored; plugins are expected to bounds-check
    /// and report an execution error instead.
    #[must_use]
    pub fn with_memory(mut self, index: usize, value: i64) -> Self {
        if let Some(slot) = self.memory.get_mut(index) {
            *slot = value;
        }
        self
    }

    /// Returns this state with the program counter set to `pc`.
    #[must_use]
    pub fn with_program_counter(mut self, pc: usize) -> Self {
        self.program_counter = pc;
        self
    }

    /// Computes what changed going from `self` to `next`.
    pub fn diff(&self, next: &Self) -> StateDiff {
        let mut registers = Vec::new();
        for (name, &after) in &next.registers {
            let before = self.registers.get(name).copied().unwrap_or(0);
            if before != after {
                registers.push(RegisterChange {
                    name: name.clone(),
                    before,
                    after,
                });
            }
        }

        let memory = next
            .memory
            .iter()
            .enumerate()
            .filter_map(|(index, &after)| {
                let before = self.memory.get(index).copied().unwrap_or(0);
                (before != after).then_some(MemoryChange {
                    index,
                    before,
                    after,
                })
            })
            .collect();

        StateDiff {
            registers,
            memory,
            program_counter: (self.program_counter, next.program_counter),
        }
    }
}

/// One register that changed value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterChange {
    /// Register name.
    pub name: String,
    /// Value before the step.
    pub before: i64,
    /// Value after the step.
    pub after: i64,
}

/// One memory word that changed value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryChange {
    /// Word index.
    pub index: usize,
    /// Value before the step.
    pub before: i64,
    /// Value after the step.
    pub after: i64,
}

/// Observable change between two consecutive snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateDiff {
    /// Registers whose value changed, ordered by name.
    pub registers: Vec<RegisterChange>,
    /// Memory words whose value changed, ordered by index.
    pub memory: Vec<MemoryChange>,
    /// Program counter before and after.
    pub program_counter: (usize, usize),
}

impl StateDiff {
    /// Returns `true` if the program counter moved somewhere other than the next instruction.
    pub fn is_jump(&self) -> bool {
        let (before, after) = self.program_counter;
        before.checked_add(1) != Some(after)
    }
}

impl fmt::Display for StateDiff {
    /// Renders the diff as `R0 <- 5, mem[2] <- 7, pc <- 4`.
    ///
    /// The program counter is only shown when the step jumped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .registers
            .iter()
            .map(|c| format!("{} <- {}", c.name, c.after))
            .collect();
        parts.extend(
            self.memory
                .iter()
                .map(|c| format!("mem[{}] <- {}", c.index, c.after)),
        );
        if self.is_jump() {
            parts.push(format!("pc <- {}", self.program_counter.1));
        }
        if parts.is_empty() {
            f.write_str("(no change)")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
