//! stepsim command-line front end.
//!
//! This binary drives the compile-and-step engine from a terminal. It performs:
//! 1. **Listing plugins:** Shows every registered processor and its configuration.
//! 2. **Compiling:** Prints the instruction listing a processor produces for a source file.
//! 3. **Running:** Steps a program to completion and prints each state change, the halt cause, and statistics.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, process};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use stepsim_core::common::{InstructionRecord, format_address};
use stepsim_core::config::{ConfigError, EngineConfig};
use stepsim_core::isa::builtin_registry;
use stepsim_core::plugin::registry::install_global;
use stepsim_core::plugin::{PluginRegistry, ProcessorDescriptor, ProcessorPlugin};
use stepsim_core::sim::{HaltCause, HistoryEntry, RunOutcome, StepController, compile_program};
use stepsim_core::stats::RunStats;

#[derive(Parser, Debug)]
#[command(
    name = "stepsim",
    author,
    version,
    about = "Compile a small program for a pluggable processor and step through it",
    long_about = "Compile a small C-like program for a pluggable processor and step through it,\nprinting the register and memory changes made by every instruction.\n\nExamples:\n  stepsim plugins\n  stepsim compile -p mini8 program.c\n  stepsim run -p mini8 program.c --max-steps 100"
)]
struct Cli {
    /// Log engine activity (each step at debug level) to stderr.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered processors.
    Plugins {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compile a source file and print the instruction listing.
    Compile {
        /// Processor id.
        #[arg(short, long, default_value = "mini8")]
        plugin: String,

        /// Source file.
        file: PathBuf,
    },

    /// Compile and run a source file.
    Run {
        /// Processor id.
        #[arg(short, long, default_value = "mini8")]
        plugin: String,

        /// Source file.
        file: PathBuf,

        /// JSON engine config file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Step cap; overrides the config file.
        #[arg(long)]
        max_steps: Option<usize>,

        /// Print the full run (listing, history, halt cause, statistics) as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Machine-readable result of `stepsim run --json`.
#[derive(Serialize)]
struct RunReport<'a> {
    plugin: &'a ProcessorDescriptor,
    program: &'a [InstructionRecord],
    history: Vec<&'a HistoryEntry>,
    halt: Option<&'a HaltCause>,
    stats: RunStats,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    let registry = match builtin_registry().and_then(install_global) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Plugins { json } => cmd_plugins(registry, json),
        Commands::Compile { plugin, file } => cmd_compile(registry, &plugin, &file),
        Commands::Run {
            plugin,
            file,
            config,
            max_steps,
            json,
        } => cmd_run(registry, &plugin, &file, config.as_deref(), max_steps, json),
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins; otherwise `--trace`
/// selects `debug` for the engine and the default is `warn`.
fn init_tracing(trace: bool) {
    let default = if trace { "stepsim_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints every registered processor.
fn cmd_plugins(registry: &PluginRegistry, json: bool) {
    if json {
        let descriptors: Vec<&ProcessorDescriptor> =
            registry.iter().map(|p| p.descriptor()).collect();
        print_json(&descriptors);
        return;
    }
    for plugin in registry.iter() {
        let d = plugin.descriptor();
        println!(
            "{:<10} {}  (registers: {}; memory: {} x {}-bit words)",
            d.id,
            d.name,
            d.registers.join(", "),
            d.memory.size,
            d.memory.word_size
        );
    }
}

/// Compiles `file` and prints the listing.
fn cmd_compile(registry: &PluginRegistry, plugin_id: &str, file: &Path) {
    let plugin = lookup(registry, plugin_id);
    let source = read_source(file);
    match compile_program(plugin.as_ref(), &source) {
        Ok(program) => {
            for line in program.listing() {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("Error: {}: {e}", file.display());
            process::exit(1);
        }
    }
}

/// Compiles and runs `file`, printing each step's changes.
///
/// Exits with 0 when the program ran off its end, 2 when the step cap was
/// hit, and 1 for every other failure.
fn cmd_run(
    registry: &PluginRegistry,
    plugin_id: &str,
    file: &Path,
    config_path: Option<&Path>,
    max_steps: Option<usize>,
    json: bool,
) {
    let config = resolve_config(config_path, max_steps).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let plugin = lookup(registry, plugin_id);
    let source = read_source(file);
    let mut controller = StepController::new(config);
    if let Err(e) = controller.load(Arc::clone(&plugin), &source) {
        eprintln!("Error: {}: {e}", file.display());
        process::exit(1);
    }

    let cause = match controller.run() {
        Ok(RunOutcome::Halted(cause)) => cause,
        Ok(RunOutcome::Cancelled(progress)) => {
            eprintln!("Run suspended after {} steps", progress.steps);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let (Some(program), Some(history)) = (controller.program(), controller.history()) else {
        eprintln!("Error: no program loaded");
        process::exit(1);
    };
    let stats = RunStats::from_history(history);

    if json {
        print_json(&RunReport {
            plugin: plugin.descriptor(),
            program: program.instructions(),
            history: history.entries().collect(),
            halt: controller.halt_cause(),
            stats,
        });
    } else {
        let memory_size = program.layout().size;
        let mut previous = history.seed();
        for entry in history.entries().skip(1) {
            if let Some(inst) = &entry.instruction {
                println!(
                    "[{:>4}] {}  {:<16} {}",
                    entry.step,
                    format_address(inst.address, memory_size),
                    inst.text,
                    previous.diff(&entry.state)
                );
            }
            previous = &entry.state;
        }
        println!("\n[*] {cause}");
        print_state(plugin.as_ref(), &controller);
        stats.print();
    }

    process::exit(match cause {
        HaltCause::ProgramCounterOutOfBounds { .. } => 0,
        HaltCause::StepLimitExceeded { .. } => 2,
        HaltCause::ExecutionFault { .. } | HaltCause::ContractViolation { .. } => 1,
    });
}

/// Loads the engine config file, if any, and applies `--max-steps` on top.
///
/// `--trace` only changes the log filter; per-step diff logging stays as the
/// config file sets it.
fn resolve_config(path: Option<&Path>, max_steps: Option<usize>) -> Result<EngineConfig, ConfigError> {
    let mut config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(limit) = max_steps {
        config.max_steps = limit;
    }
    Ok(config)
}

/// Prints the final registers in declaration order, then memory.
fn print_state(plugin: &dyn ProcessorPlugin, controller: &StepController) {
    let Some(state) = controller.state() else {
        return;
    };
    let registers: Vec<String> = plugin
        .descriptor()
        .registers
        .iter()
        .map(|name| format!("{name}={}", state.register(name).unwrap_or(0)))
        .collect();
    println!("    registers: {}", registers.join("  "));
    println!("    memory:    {:?}", state.memory());
    println!("    pc:        {}", state.program_counter());
}

fn lookup(registry: &PluginRegistry, id: &str) -> Arc<dyn ProcessorPlugin> {
    registry.get(id).unwrap_or_else(|| {
        let known: Vec<&str> = registry.ids().collect();
        eprintln!("Error: unknown processor '{id}' (available: {})", known.join(", "));
        process::exit(1);
    })
}

fn read_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    })
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
