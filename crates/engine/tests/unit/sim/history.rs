//! # History Tests

use std::sync::Arc;

use stepsim_core::common::{InstructionRecord, MachineState};
use stepsim_core::sim::History;

fn seed() -> Arc<MachineState> {
    Arc::new(MachineState::zeroed(&["A"], 1))
}

fn grown(steps: usize) -> History {
    let mut history = History::new(seed());
    for i in 1..=steps {
        let state = MachineState::zeroed(&["A"], 1)
            .with_register("A", i as i64)
            .with_program_counter(i);
        let _ = history.append(Arc::new(state), InstructionRecord::new(i as u64 - 1, "INC", "0001"));
    }
    history
}

#[test]
fn test_new_history_holds_only_seed() {
    let history = History::new(seed());
    assert_eq!(history.len(), 1);
    assert_eq!(history.steps(), 0);
    assert!(!history.is_empty());
    assert_eq!(history.latest().step, 0);
    assert!(history.latest().instruction.is_none());
    assert!(Arc::ptr_eq(history.seed(), &history.latest().state));
}

#[test]
fn test_append_returns_step_index() {
    let mut history = History::new(seed());
    let state = Arc::new(MachineState::zeroed(&["A"], 1).with_program_counter(1));
    let step = history.append(Arc::clone(&state), InstructionRecord::new(0, "NOP", "0000"));
    assert_eq!(step, 1);
    assert!(Arc::ptr_eq(history.at(1).unwrap(), &state));
    assert_eq!(history.entry(1).unwrap().instruction.as_ref().unwrap().text, "NOP");
}

#[test]
fn test_truncate_after_drops_later_steps() {
    let mut history = grown(5);
    history.truncate_after(2);
    assert_eq!(history.steps(), 2);
    assert_eq!(history.latest().state.register("A"), Some(2));
    assert!(history.at(3).is_none());
}

#[test]
fn test_truncate_after_past_end_is_noop() {
    let mut history = grown(3);
    history.truncate_after(10);
    assert_eq!(history.steps(), 3);
}

#[test]
fn test_reset_to_seed_keeps_seed() {
    let mut history = grown(4);
    let seed = Arc::clone(history.seed());
    history.reset_to_seed();
    assert_eq!(history.len(), 1);
    assert!(Arc::ptr_eq(history.seed(), &seed));
}

#[test]
fn test_entries_are_numbered_in_order() {
    let history = grown(3);
    let steps: Vec<usize> = history.entries().map(|e| e.step).collect();
    assert_eq!(steps, vec![0, 1, 2, 3]);
}

#[test]
fn test_append_after_truncate_overwrites_future() {
    let mut history = grown(3);
    history.truncate_after(1);
    let step = history.append(seed(), InstructionRecord::new(1, "NOP", "0000"));
    assert_eq!(step, 2);
    assert_eq!(history.steps(), 2);
    assert_eq!(history.latest().state.register("A"), Some(0));
}
