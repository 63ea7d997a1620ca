//! History/snapshot log.
//!
//! The history is the single active timeline of a run: a seed entry holding
//! the initial state, followed by one entry per executed step. Entries hold
//! `Arc`s, so handing them to a viewer never copies a state.

use std::sync::Arc;

use serde::Serialize;

use crate::common::{InstructionRecord, MachineState};

/// One point in the timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Step index; 0 is the seed.
    pub step: usize,
    /// State after the step.
    pub state: Arc<MachineState>,
    /// Instruction that produced this state; `None` for the seed.
    pub instruction: Option<InstructionRecord>,
}

/// Append-only log of machine states, truncated only by rewind or reset.
///
/// Always holds at least the seed entry, so `len() == steps + 1`.
#[derive(Clone, Debug, Serialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Creates a history holding only `seed`.
    pub fn new(seed: Arc<MachineState>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                step: 0,
                state: seed,
                instruction: None,
            }],
        }
    }

    /// Appends the state produced by executing `instruction` and returns its step index.
    pub fn append(&mut self, state: Arc<MachineState>, instruction: InstructionRecord) -> usize {
        let step = self.entries.len();
        self.entries.push(HistoryEntry {
            step,
            state,
            instruction: Some(instruction),
        });
        step
    }

    /// Drops every entry after `index`. The seed is never dropped.
    pub fn truncate_after(&mut self, index: usize) {
        self.entries.truncate(index.saturating_add(1).max(1));
    }

    /// Drops everything but the seed.
    pub fn reset_to_seed(&mut self) {
        self.truncate_after(0);
    }

    /// Returns the state at step `index`.
    pub fn at(&self, index: usize) -> Option<&Arc<MachineState>> {
        self.entries.get(index).map(|e| &e.state)
    }

    /// Returns the full entry at step `index`.
    pub fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Returns the most recent entry.
    pub fn latest(&self) -> &HistoryEntry {
        // `new` seeds the log and `truncate_after` never drops the seed.
        &self.entries[self.entries.len() - 1]
    }

    /// Returns the seed state.
    pub fn seed(&self) -> &Arc<MachineState> {
        &self.entries[0].state
    }

    /// Number of entries, including the seed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: a history holds at least its seed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of steps recorded (entries after the seed).
    pub fn steps(&self) -> usize {
        self.entries.len() - 1
    }

    /// Iterates over entries from the seed onwards.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
