//! mini8: an 8-bit teaching processor.
//!
//! Two registers (`R0`, `R1`), four words of memory, 8-bit instructions.
//! Execution decodes the bit-string encoding, never the mnemonic text, so a
//! corrupted encoding surfaces as an execution error.

/// Source compiler.
pub mod compiler;

/// Instruction word layout, decode, and disassembly.
pub mod encoding;

use crate::common::{CompileError, ExecutionError, InstructionRecord, MachineState};
use crate::plugin::{MemoryLayout, ProcessorDescriptor, ProcessorPlugin};

use encoding::{Op, REGISTERS, WORD_BITS, reg_name};

/// Plugin identifier.
pub const ID: &str = "mini8";

/// Memory size in words.
pub const MEMORY_WORDS: usize = 4;

/// The mini8 processor plugin.
#[derive(Debug, Clone)]
pub struct Mini8 {
    descriptor: ProcessorDescriptor,
}

impl Default for Mini8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mini8 {
    /// Creates the plugin.
    pub fn new() -> Self {
        Self {
            descriptor: ProcessorDescriptor::new(
                ID,
                "Mini8 teaching processor",
                REGISTERS,
                MemoryLayout {
                    size: MEMORY_WORDS,
                    word_size: WORD_BITS,
                },
            ),
        }
    }
}

/// Wraps an arithmetic result to a signed 8-bit value.
#[inline]
fn wrap8(value: i64) -> i64 {
    i64::from(value as i8)
}

fn read(state: &MachineState, reg: u8) -> Result<i64, ExecutionError> {
    let name = reg_name(reg);
    state
        .register(name)
        .ok_or_else(|| ExecutionError::new(format!("register {name} is missing from the state")))
}

impl ProcessorPlugin for Mini8 {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    fn compile(&self, source: &str) -> Result<Vec<InstructionRecord>, CompileError> {
        compiler::compile(source, MEMORY_WORDS)
    }

    fn execute(
        &self,
        instruction: &InstructionRecord,
        state: &MachineState,
    ) -> Result<MachineState, ExecutionError> {
        let word = instruction
            .encoding_bits()
            .filter(|_| instruction.encoding.len() == WORD_BITS as usize)
            .and_then(|bits| u8::try_from(bits).ok())
            .ok_or_else(|| {
                ExecutionError::new(format!(
                    "cannot parse encoding '{}' at address {}",
                    instruction.encoding, instruction.address
                ))
            })?;
        let op = Op::decode(word).ok_or_else(|| {
            ExecutionError::new(format!(
                "illegal instruction {word:#010b} at address {}",
                instruction.address
            ))
        })?;

        let next = state.clone();
        let next = match op {
            Op::Load { rd, imm } => next.with_register(reg_name(rd), i64::from(imm)),
            Op::Add { rd, rs } => {
                let value = wrap8(read(state, rd)?.wrapping_add(read(state, rs)?));
                next.with_register(reg_name(rd), value)
            }
            Op::Sub { rd, rs } => {
                let value = wrap8(read(state, rd)?.wrapping_sub(read(state, rs)?));
                next.with_register(reg_name(rd), value)
            }
            Op::Store { rs, addr } => {
                if addr as usize >= MEMORY_WORDS {
                    return Err(ExecutionError::new(format!(
                        "store to address {addr} outside memory of {MEMORY_WORDS} words"
                    )));
                }
                next.with_memory(addr as usize, read(state, rs)?)
            }
        };
        Ok(next)
    }
}
