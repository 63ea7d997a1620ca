//! Run statistics.
//!
//! Statistics are derived from a [`History`] rather than counted while
//! stepping, so they always describe the active timeline, even after a
//! rewind. This module provides:
//! 1. **Totals:** Steps executed and program-counter overrides (jumps).
//! 2. **Activity:** Register and memory writes, and the busiest register.
//! 3. **Reporting:** A plain-text report split into selectable sections.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::sim::History;

/// Section names for selective stats output.
///
/// Pass an empty slice to `render_sections` to include all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "activity"];

/// Statistics describing one timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Instructions executed.
    pub steps: usize,
    /// Steps after which the program counter was not the next instruction.
    pub jumps: usize,
    /// Register value changes across all steps.
    pub register_writes: usize,
    /// Memory word changes across all steps.
    pub memory_writes: usize,
    /// Steps that changed nothing observable except the program counter.
    pub silent_steps: usize,
    /// Value changes per register.
    pub writes_per_register: BTreeMap<String, usize>,
}

impl RunStats {
    /// Computes statistics for every step recorded in `history`.
    pub fn from_history(history: &History) -> Self {
        let mut stats = Self::default();
        let mut previous = history.seed();

        for entry in history.entries().skip(1) {
            let diff = previous.diff(&entry.state);
            stats.steps += 1;
            if diff.is_jump() {
                stats.jumps += 1;
            }
            if diff.registers.is_empty() && diff.memory.is_empty() {
                stats.silent_steps += 1;
            }
            stats.register_writes += diff.registers.len();
            stats.memory_writes += diff.memory.len();
            for change in diff.registers {
                *stats.writes_per_register.entry(change.name).or_insert(0) += 1;
            }
            previous = &entry.state;
        }
        stats
    }

    /// Register written most often, ties broken by name.
    pub fn busiest_register(&self) -> Option<(&str, usize)> {
        self.writes_per_register
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, &count)| (name.as_str(), count))
    }

    /// Renders the requested sections as text.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`].
    /// Pass an empty slice to render everything.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let steps = self.steps.max(1);
        let mut out = String::new();

        let _ = writeln!(out, "==========================================================");
        let _ = writeln!(out, "RUN STATISTICS");
        let _ = writeln!(out, "==========================================================");
        if want("summary") {
            let _ = writeln!(out, "steps                    {}", self.steps);
            let _ = writeln!(
                out,
                "jumps                    {} ({:.2}%)",
                self.jumps,
                (self.jumps as f64 / steps as f64) * 100.0
            );
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        if want("activity") {
            let _ = writeln!(out, "STATE ACTIVITY");
            let _ = writeln!(out, "  writes.register        {}", self.register_writes);
            let _ = writeln!(out, "  writes.memory          {}", self.memory_writes);
            let _ = writeln!(out, "  steps.silent           {}", self.silent_steps);
            if let Some((name, count)) = self.busiest_register() {
                let _ = writeln!(out, "  busiest.register       {name} ({count} writes)");
            }
            let _ = writeln!(out, "----------------------------------------------------------");
        }
        out
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        print!("{}", self.render_sections(&[]));
    }
}
