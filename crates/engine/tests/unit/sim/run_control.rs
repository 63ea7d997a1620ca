//! # Run Control Tests
//!
//! `run_with` yields to its observer every `yield_every` steps and can be
//! suspended either from the observer or through a `CancelHandle`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use pretty_assertions::assert_eq;
use stepsim_core::config::EngineConfig;
use stepsim_core::sim::{HaltCause, Phase, RunOutcome, RunProgress};

use crate::common::harness::TestContext;

fn batched(yield_every: usize) -> EngineConfig {
    EngineConfig {
        yield_every,
        ..EngineConfig::default()
    }
}

#[test]
fn test_observer_called_after_each_full_batch() {
    let mut ctx = TestContext::with_config(batched(2)).tick("INC\nINC\nINC\nINC\nINC");
    let mut seen = Vec::new();

    let outcome = ctx
        .controller
        .run_with(|progress| {
            seen.push(*progress);
            ControlFlow::Continue(())
        })
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Halted(HaltCause::ProgramCounterOutOfBounds { pc: 5 })
    );
    assert_eq!(
        seen,
        vec![
            RunProgress {
                steps: 2,
                program_counter: 2
            },
            RunProgress {
                steps: 4,
                program_counter: 4
            },
        ]
    );
}

#[test]
fn test_observer_break_suspends_and_resumes() {
    let mut ctx = TestContext::with_config(batched(3)).tick("INC\nINC\nINC\nINC\nINC");

    let outcome = ctx
        .controller
        .run_with(|_| ControlFlow::Break(()))
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Cancelled(RunProgress {
            steps: 3,
            program_counter: 3
        })
    );
    assert_eq!(ctx.controller.phase(), &Phase::Running);
    assert_eq!(ctx.reg("ACC"), 3);

    let outcome = ctx.controller.run().unwrap();
    assert!(matches!(outcome, RunOutcome::Halted(cause) if cause.is_normal()));
    assert_eq!(ctx.reg("ACC"), 5);
}

#[test]
fn test_cancel_before_run_is_discarded() {
    let mut ctx = TestContext::with_config(batched(1)).tick("INC\nINC\nINC");
    let handle = ctx.controller.cancel_handle();
    handle.cancel();
    assert!(handle.is_cancelled());

    let outcome = ctx.controller.run().unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Halted(HaltCause::ProgramCounterOutOfBounds { pc: 3 })
    );
    assert!(!handle.is_cancelled());
    assert_eq!(ctx.reg("ACC"), 3);
}

#[test]
fn test_cancel_after_halt_does_not_leak_into_next_run() {
    let mut ctx = TestContext::with_config(batched(1)).tick("INC\nINC");
    let _ = ctx.controller.run().unwrap();
    ctx.controller.cancel_handle().cancel();

    ctx.controller.reset().unwrap();
    assert_eq!(
        ctx.controller.run().unwrap(),
        RunOutcome::Halted(HaltCause::ProgramCounterOutOfBounds { pc: 2 })
    );

    ctx.controller.cancel_handle().cancel();
    ctx.controller.rewind_to(0).unwrap();
    assert!(matches!(
        ctx.controller.run().unwrap(),
        RunOutcome::Halted(cause) if cause.is_normal()
    ));
    assert_eq!(ctx.controller.history().unwrap().steps(), 2);
}

#[test]
fn test_cancel_from_observer() {
    let mut ctx = TestContext::with_config(batched(1)).tick("NOP\nJMP 0");
    let handle = ctx.controller.cancel_handle();
    let mut calls = 0;

    let outcome = ctx
        .controller
        .run_with(|_| {
            calls += 1;
            if calls == 3 {
                handle.cancel();
            }
            ControlFlow::Continue(())
        })
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Cancelled(p) if p.steps == 3));
    assert_eq!(ctx.controller.history().unwrap().steps(), 3);
}

#[test]
fn test_cancel_from_another_thread() {
    let cfg = EngineConfig {
        max_steps: usize::MAX,
        yield_every: 16,
        trace_steps: false,
    };
    let mut ctx = TestContext::with_config(cfg).tick("NOP\nJMP 0");
    let handle = ctx.controller.cancel_handle();

    let done = Arc::new(AtomicBool::new(false));
    let stop = Arc::clone(&done);

    let canceller = thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            handle.cancel();
            thread::yield_now();
        }
    });
    let outcome = ctx.controller.run().unwrap();
    done.store(true, Ordering::SeqCst);
    canceller.join().unwrap();

    let RunOutcome::Cancelled(progress) = outcome else {
        panic!("expected a suspended run, got {outcome:?}");
    };
    assert_eq!(progress.steps % 16, 0);
    assert_eq!(ctx.controller.history().unwrap().steps(), progress.steps);
}

#[test]
fn test_zero_yield_every_is_one() {
    let mut ctx = TestContext::with_config(batched(0)).tick("INC\nINC");
    let mut calls = 0;
    let _ = ctx
        .controller
        .run_with(|_| {
            calls += 1;
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(calls, 2);
}

#[test]
fn test_run_on_halted_returns_cause_without_observer() {
    let mut ctx = TestContext::new().tick("INC");
    let first = ctx.controller.run().unwrap();
    let mut called = false;
    let second = ctx
        .controller
        .run_with(|_| {
            called = true;
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(first, second);
    assert!(!called);
}
