//! Step Controller.
//!
//! The controller drives one plugin through one compiled program, one
//! instruction per step, and records every resulting state in a [`History`].
//!
//! # Phases
//!
//! `Idle` → `load` → `Ready` → `step` → `Running` → ... → `Halted(cause)`.
//! `reset` returns to `Ready`; `rewind_to` returns to `Running` at an
//! earlier step. Every transition either completes or leaves the controller
//! untouched.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::compiler::{CompiledProgram, compile_program};
use super::history::History;
use crate::common::error::Result;
use crate::common::{
    ContractViolation, EngineError, ExecutionError, InstructionRecord, MachineState, StateDiff,
};
use crate::config::EngineConfig;
use crate::plugin::ProcessorPlugin;

/// Why a run stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum HaltCause {
    /// The program counter left the program. This is normal termination.
    ProgramCounterOutOfBounds {
        /// The out-of-range program counter.
        pc: usize,
    },

    /// The plugin failed to execute the instruction at `pc`.
    ExecutionFault {
        /// Program counter of the faulting instruction.
        pc: usize,
        /// The plugin's error.
        error: ExecutionError,
    },

    /// `execute` returned a state that does not match the plugin's declared shape.
    ContractViolation {
        /// Program counter of the instruction being executed.
        pc: usize,
        /// What was wrong with the state.
        violation: ContractViolation,
    },

    /// `run` reached the configured step cap.
    StepLimitExceeded {
        /// The cap that was reached.
        limit: usize,
    },
}

impl HaltCause {
    /// Returns `true` if the program simply ran off its end.
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::ProgramCounterOutOfBounds { .. })
    }
}

impl fmt::Display for HaltCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramCounterOutOfBounds { pc } => {
                write!(f, "program finished (pc {pc} is past the last instruction)")
            }
            Self::ExecutionFault { pc, error } => write!(f, "execution fault at pc {pc}: {error}"),
            Self::ContractViolation { pc, violation } => {
                write!(f, "contract violation at pc {pc}: {violation}")
            }
            Self::StepLimitExceeded { limit } => write!(f, "step limit of {limit} exceeded"),
        }
    }
}

/// Controller phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No program loaded.
    Idle,
    /// Program loaded, at the initial state.
    Ready,
    /// At least one step taken, or rewound.
    Running,
    /// Terminal until `reset`, `rewind_to`, or `load`.
    Halted(HaltCause),
}

/// A step that executed an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stepped {
    /// History index of the new state.
    pub step: usize,
    /// The instruction that was executed.
    pub instruction: InstructionRecord,
    /// What the instruction changed.
    pub diff: StateDiff,
}

/// Result of a call to [`StepController::step`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    /// One instruction executed.
    Stepped(Stepped),
    /// The controller is halted; nothing executed.
    Halted(HaltCause),
}

/// Snapshot handed to a `run_with` observer at each yield point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    /// Steps in the active timeline.
    pub steps: usize,
    /// Current program counter.
    pub program_counter: usize,
}

/// Result of [`StepController::run`] and [`StepController::run_with`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// The run reached a halt.
    Halted(HaltCause),
    /// The run was suspended at a yield point; the controller is still `Running`.
    Cancelled(RunProgress),
}

/// Shareable flag that suspends a `run_with` at its next yield point.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation of the run in progress.
    ///
    /// A request made while no run is in progress is dropped when the next run starts.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if a cancellation is pending.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears a pending cancellation and reports whether there was one.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Everything that belongs to one loaded program.
struct LoadedRun {
    plugin: Arc<dyn ProcessorPlugin>,
    program: CompiledProgram,
    history: History,
}

/// Drives a processor plugin through a compiled program one instruction at a time.
///
/// Not meant for concurrent use: every transition takes `&mut self`.
pub struct StepController {
    config: EngineConfig,
    run: Option<LoadedRun>,
    phase: Phase,
    cancel: CancelHandle,
}

impl fmt::Debug for StepController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StepController");
        let _ = s.field("phase", &self.phase).field("config", &self.config);
        if let Some(run) = &self.run {
            let _ = s
                .field("plugin", &run.plugin.descriptor().id)
                .field("instructions", &run.program.len())
                .field("steps", &run.history.steps());
        }
        s.finish()
    }
}

impl Default for StepController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl StepController {
    /// Creates an idle controller.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            run: None,
            phase: Phase::Idle,
            cancel: CancelHandle::default(),
        }
    }

    /// Compiles `source` with `plugin` and installs it, seeding the history.
    ///
    /// Allowed from any phase. On error the controller is unchanged: the
    /// previous program, history, and phase are kept.
    ///
    /// # Errors
    ///
    /// * `EngineError::Compile` - The plugin rejected the source.
    /// * `EngineError::Contract` - The descriptor, compiled records, or
    ///   initial state break the plugin contract.
    pub fn load(&mut self, plugin: Arc<dyn ProcessorPlugin>, source: &str) -> Result<()> {
        let program = compile_program(plugin.as_ref(), source)?;
        let initial = resolve_initial_state(plugin.as_ref())?;

        info!(
            plugin = %plugin.descriptor().id,
            instructions = program.len(),
            "program loaded"
        );
        self.run = Some(LoadedRun {
            plugin,
            program,
            history: History::new(Arc::new(initial)),
        });
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Executes the instruction at the program counter.
    ///
    /// If the program counter is outside the program, the controller halts
    /// with `ProgramCounterOutOfBounds`. If the plugin fails, it halts with
    /// `ExecutionFault` (or `ContractViolation` for a malformed state) and
    /// the history is left as it was. Calling `step` while halted returns
    /// the existing cause and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotLoaded` when idle.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Phase::Halted(cause) = &self.phase {
            return Ok(StepOutcome::Halted(cause.clone()));
        }
        let run = self.run.as_mut().ok_or(EngineError::NotLoaded)?;

        match advance(run) {
            Ok(stepped) => {
                if self.config.trace_steps {
                    info!(
                        step = stepped.step,
                        instruction = %stepped.instruction.text,
                        "{}",
                        stepped.diff
                    );
                }
                self.phase = Phase::Running;
                Ok(StepOutcome::Stepped(stepped))
            }
            Err(cause) => Ok(StepOutcome::Halted(self.halt(cause))),
        }
    }

    /// Steps until halted, cancelled, or the step cap is reached.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotLoaded` when idle.
    pub fn run(&mut self) -> Result<RunOutcome> {
        self.run_with(|_| ControlFlow::Continue(()))
    }

    /// Like [`run`](Self::run), but hands control to `observer` after every
    /// batch of `yield_every` steps.
    ///
    /// Returning `ControlFlow::Break` from the observer, or cancelling via
    /// [`cancel_handle`](Self::cancel_handle), suspends the run at that
    /// point. Suspension keeps everything the completed steps produced.
    /// A cancellation requested before this call is discarded.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotLoaded` when idle.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<RunOutcome>
    where
        F: FnMut(&RunProgress) -> ControlFlow<()>,
    {
        if self.run.is_none() {
            return Err(EngineError::NotLoaded);
        }
        if self.cancel.take() {
            debug!("discarded stale cancel request");
        }
        let batch = self.config.batch_size();
        let mut in_batch = 0;

        loop {
            if let Phase::Halted(cause) = &self.phase {
                return Ok(RunOutcome::Halted(cause.clone()));
            }

            if in_batch == batch {
                in_batch = 0;
                let progress = self.progress()?;
                if observer(&progress).is_break() || self.cancel.take() {
                    info!(steps = progress.steps, "run suspended");
                    return Ok(RunOutcome::Cancelled(progress));
                }
            }

            if self.at_step_limit()? {
                let limit = self.config.max_steps;
                return Ok(RunOutcome::Halted(
                    self.halt(HaltCause::StepLimitExceeded { limit }),
                ));
            }

            let _ = self.step()?;
            in_batch += 1;
        }
    }

    /// Returns to the initial state of the loaded program without recompiling.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotLoaded` when idle.
    pub fn reset(&mut self) -> Result<()> {
        let run = self.run.as_mut().ok_or(EngineError::NotLoaded)?;
        run.history.reset_to_seed();
        self.phase = Phase::Ready;
        info!("controller reset");
        Ok(())
    }

    /// Rewinds to history step `step`, discarding every later step.
    ///
    /// Subsequent steps continue from the restored state and overwrite the
    /// discarded future.
    ///
    /// # Errors
    ///
    /// * `EngineError::NotLoaded` - When idle.
    /// * `EngineError::StepOutOfRange` - `step` is past the last recorded step.
    pub fn rewind_to(&mut self, step: usize) -> Result<()> {
        let run = self.run.as_mut().ok_or(EngineError::NotLoaded)?;
        let last = run.history.steps();
        if step > last {
            return Err(EngineError::StepOutOfRange {
                requested: step,
                last,
            });
        }
        run.history.truncate_after(step);
        self.phase = Phase::Running;
        debug!(step, discarded = last - step, "rewound");
        Ok(())
    }

    /// Current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Halt cause, if halted.
    pub fn halt_cause(&self) -> Option<&HaltCause> {
        match &self.phase {
            Phase::Halted(cause) => Some(cause),
            _ => None,
        }
    }

    /// Current machine state.
    pub fn state(&self) -> Option<&Arc<MachineState>> {
        self.run.as_ref().map(|r| &r.history.latest().state)
    }

    /// State the loaded program started from.
    pub fn initial_state(&self) -> Option<&Arc<MachineState>> {
        self.run.as_ref().map(|r| r.history.seed())
    }

    /// History of the active timeline.
    pub fn history(&self) -> Option<&History> {
        self.run.as_ref().map(|r| &r.history)
    }

    /// The loaded program.
    pub fn program(&self) -> Option<&CompiledProgram> {
        self.run.as_ref().map(|r| &r.program)
    }

    /// The active plugin.
    pub fn plugin(&self) -> Option<&Arc<dyn ProcessorPlugin>> {
        self.run.as_ref().map(|r| &r.plugin)
    }

    /// Instruction the next `step` would execute, if the program counter is in range.
    pub fn current_instruction(&self) -> Option<&InstructionRecord> {
        let run = self.run.as_ref()?;
        run.program
            .get(run.history.latest().state.program_counter())
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the configuration; takes effect on the next step or run.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    /// Returns a handle that can cancel a `run_with` from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    fn halt(&mut self, cause: HaltCause) -> HaltCause {
        if cause.is_normal() {
            info!(%cause, "halted");
        } else {
            warn!(%cause, "halted");
        }
        self.phase = Phase::Halted(cause.clone());
        cause
    }

    fn progress(&self) -> Result<RunProgress> {
        let run = self.run.as_ref().ok_or(EngineError::NotLoaded)?;
        Ok(RunProgress {
            steps: run.history.steps(),
            program_counter: run.history.latest().state.program_counter(),
        })
    }

    /// The cap only applies while there is an instruction left to run, so a
    /// program that finishes exactly at the cap still halts normally.
    fn at_step_limit(&self) -> Result<bool> {
        let run = self.run.as_ref().ok_or(EngineError::NotLoaded)?;
        let pc = run.history.latest().state.program_counter();
        Ok(run.history.steps() >= self.config.max_steps && pc < run.program.len())
    }
}

/// Executes one instruction of `run`, appending the result to its history.
fn advance(run: &mut LoadedRun) -> std::result::Result<Stepped, HaltCause> {
    let current = Arc::clone(&run.history.latest().state);
    let pc = current.program_counter();
    let instruction = run
        .program
        .get(pc)
        .ok_or(HaltCause::ProgramCounterOutOfBounds { pc })?
        .clone();

    debug!(
        step = run.history.steps() + 1,
        pc,
        instruction = %instruction.text,
        "executing"
    );
    let next = run
        .plugin
        .execute(&instruction, &current)
        .map_err(|error| HaltCause::ExecutionFault { pc, error })?;
    run.plugin
        .descriptor()
        .check_state(&next, "execute")
        .map_err(|violation| HaltCause::ContractViolation { pc, violation })?;

    let next = if next.program_counter() == pc {
        next.with_program_counter(pc + 1)
    } else {
        trace!(from = pc, to = next.program_counter(), "plugin set program counter");
        next
    };

    let diff = current.diff(&next);
    let step = run.history.append(Arc::new(next), instruction.clone());
    Ok(Stepped {
        step,
        instruction,
        diff,
    })
}

/// Returns the plugin's initial state after checking it, or the zeroed default.
fn resolve_initial_state(plugin: &dyn ProcessorPlugin) -> Result<MachineState> {
    let descriptor = plugin.descriptor();
    match plugin.initial_state() {
        Some(state) => {
            descriptor.check_state(&state, "initial")?;
            if state.program_counter() != 0 {
                return Err(ContractViolation::InitialProgramCounter(state.program_counter()).into());
            }
            Ok(state)
        }
        None => Ok(descriptor.zeroed_state()),
    }
}
