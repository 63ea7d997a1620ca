//! # Run Statistics Tests
//!
//! Statistics are recomputed from history, so they follow rewinds.

use pretty_assertions::assert_eq;
use stepsim_core::stats::{RunStats, STATS_SECTIONS};

use crate::common::harness::TestContext;

fn stats_of(ctx: &TestContext) -> RunStats {
    RunStats::from_history(ctx.controller.history().unwrap())
}

#[test]
fn test_fresh_history_is_empty() {
    let ctx = TestContext::new().tick("INC");
    assert_eq!(stats_of(&ctx), RunStats::default());
    assert_eq!(stats_of(&ctx).busiest_register(), None);
}

#[test]
fn test_counts_after_run() {
    let mut ctx = TestContext::new().tick("INC\nSAVE 0\nNOP\nINC\nFLAG\nJMP 7");
    let _ = ctx.controller.run().unwrap();

    let stats = stats_of(&ctx);
    assert_eq!(stats.steps, 6);
    assert_eq!(stats.jumps, 1);
    assert_eq!(stats.register_writes, 3);
    assert_eq!(stats.memory_writes, 1);
    assert_eq!(stats.silent_steps, 2);
    assert_eq!(stats.writes_per_register.get("ACC"), Some(&2));
    assert_eq!(stats.writes_per_register.get("FLAG"), Some(&1));
    assert_eq!(stats.busiest_register(), Some(("ACC", 2)));
}

#[test]
fn test_stats_follow_rewind() {
    let mut ctx = TestContext::new().tick("INC\nINC\nINC");
    let _ = ctx.controller.run().unwrap();
    ctx.controller.rewind_to(1).unwrap();
    assert_eq!(stats_of(&ctx).steps, 1);
    assert_eq!(stats_of(&ctx).register_writes, 1);
}

#[test]
fn test_busiest_register_tie_goes_to_smaller_name() {
    let mut ctx = TestContext::new().tick("INC\nFLAG");
    let _ = ctx.controller.run().unwrap();
    assert_eq!(stats_of(&ctx).busiest_register(), Some(("ACC", 1)));
}

#[test]
fn test_render_all_sections() {
    let mut ctx = TestContext::new().tick("INC\nJMP 5");
    let _ = ctx.controller.run().unwrap();
    let text = stats_of(&ctx).render_sections(&[]);

    assert!(text.contains("RUN STATISTICS"));
    assert!(text.contains("steps                    2"));
    assert!(text.contains("jumps                    1 (50.00%)"));
    assert!(text.contains("writes.register        1"));
    assert!(text.contains("busiest.register       ACC (1 writes)"));
}

#[test]
fn test_render_selected_section() {
    let stats = RunStats::default();
    let summary = stats.render_sections(&["summary".to_owned()]);
    assert!(summary.contains("jumps"));
    assert!(!summary.contains("STATE ACTIVITY"));

    let activity = stats.render_sections(&["activity".to_owned()]);
    assert!(!activity.contains("jumps"));
    assert!(activity.contains("STATE ACTIVITY"));
}

#[test]
fn test_section_names() {
    assert_eq!(STATS_SECTIONS, &["summary", "activity"]);
}
