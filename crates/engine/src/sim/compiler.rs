//! Compilation stage.
//!
//! Runs a plugin's compiler once and checks the result before the engine
//! accepts it. A plugin's own `CompileError` and an engine-detected
//! `ContractViolation` are reported separately.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::error::Result;
use crate::common::{ContractViolation, InstructionRecord, format_address};
use crate::plugin::{MemoryLayout, ProcessorPlugin};

/// An accepted, validated instruction sequence.
///
/// Replaced wholesale on recompilation; cloning shares the instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledProgram {
    instructions: Arc<[InstructionRecord]>,
    layout: MemoryLayout,
}

impl CompiledProgram {
    /// Returns the instruction at sequence position `index`.
    pub fn get(&self, index: usize) -> Option<&InstructionRecord> {
        self.instructions.get(index)
    }

    /// Returns all instructions in order.
    pub fn instructions(&self) -> &[InstructionRecord] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` for an empty program.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Memory layout the program was compiled for.
    pub fn layout(&self) -> MemoryLayout {
        self.layout
    }

    /// Renders the program as a listing, one instruction per line.
    pub fn listing(&self) -> Vec<String> {
        self.instructions
            .iter()
            .map(|inst| inst.listing_line(self.layout.size))
            .collect()
    }
}

/// Compiles `source` with `plugin` and validates the result.
///
/// Calls `plugin.compile` exactly once and keeps nothing between calls.
///
/// # Errors
///
/// * `EngineError::Compile` - The plugin rejected the source.
/// * `EngineError::Contract` - The plugin's descriptor is invalid, or an
///   encoding has the wrong width or alphabet, or addresses decrease.
pub fn compile_program(plugin: &dyn ProcessorPlugin, source: &str) -> Result<CompiledProgram> {
    let descriptor = plugin.descriptor();
    descriptor.validate()?;

    let records = plugin.compile(source)?;
    validate_records(&records, descriptor.memory)?;

    debug!(
        plugin = %descriptor.id,
        instructions = records.len(),
        "compiled program"
    );
    Ok(CompiledProgram {
        instructions: records.into(),
        layout: descriptor.memory,
    })
}

/// Checks encodings and address order of a compiled sequence.
///
/// # Errors
///
/// Returns the first `ContractViolation` found, in sequence order.
pub fn validate_records(
    records: &[InstructionRecord],
    layout: MemoryLayout,
) -> std::result::Result<(), ContractViolation> {
    let expected = layout.word_size;
    let mut previous: Option<u64> = None;

    for (index, record) in records.iter().enumerate() {
        if record.encoding.chars().any(|c| c != '0' && c != '1') {
            warn!(index, encoding = %record.encoding, "non-binary encoding");
            return Err(ContractViolation::EncodingNotBinary {
                index,
                encoding: record.encoding.clone(),
            });
        }

        let actual = record.encoding.len();
        if actual != expected as usize {
            warn!(index, expected, actual, "encoding width mismatch");
            return Err(ContractViolation::EncodingWidth {
                index,
                expected,
                actual,
            });
        }

        if let Some(prev) = previous {
            if record.address < prev {
                warn!(index, address = record.address, previous = prev, "addresses out of order");
                return Err(ContractViolation::AddressOrder {
                    index,
                    address: record.address,
                    previous: prev,
                });
            }
            if record.address == prev {
                warn!(
                    index,
                    address = %format_address(record.address, layout.size),
                    "zero-size instruction shares an address"
                );
            }
        }
        previous = Some(record.address);
    }
    Ok(())
}
