//! Instruction encoding for the mini8 processor.
//!
//! Every instruction is one 8-bit word laid out as `[op:2][reg:1][operand:5]`:
//!
//! | op   | mnemonic        | operand                              |
//! |------|-----------------|--------------------------------------|
//! | `00` | `LOAD Rd,#imm`  | immediate, 0..=31                    |
//! | `01` | `ADD Rd,Rs`     | bit 4 = Rs, bits 3..0 must be zero   |
//! | `10` | `SUB Rd,Rs`     | bit 4 = Rs, bits 3..0 must be zero   |
//! | `11` | `STORE Rs,[a]`  | word address                         |

use std::fmt;

/// Width of one instruction word in bits.
pub const WORD_BITS: u32 = 8;

/// Largest immediate a `LOAD` can carry.
pub const MAX_IMMEDIATE: u8 = 0x1F;

const OP_SHIFT: u32 = 6;
const REG_SHIFT: u32 = 5;
const REG_MASK: u8 = 0x1;
const OPERAND_MASK: u8 = 0x1F;
const SOURCE_SHIFT: u32 = 4;
const RESERVED_MASK: u8 = 0x0F;

const OP_LOAD: u8 = 0b00;
const OP_ADD: u8 = 0b01;
const OP_SUB: u8 = 0b10;
const OP_STORE: u8 = 0b11;

/// Register names, indexed by register number.
pub const REGISTERS: [&str; 2] = ["R0", "R1"];

/// A decoded mini8 instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// `rd <- imm`
    Load {
        /// Destination register number.
        rd: u8,
        /// Immediate value, 0..=31.
        imm: u8,
    },
    /// `rd <- rd + rs`
    Add {
        /// Destination and left operand.
        rd: u8,
        /// Right operand.
        rs: u8,
    },
    /// `rd <- rd - rs`
    Sub {
        /// Destination and left operand.
        rd: u8,
        /// Right operand.
        rs: u8,
    },
    /// `mem[addr] <- rs`
    Store {
        /// Source register number.
        rs: u8,
        /// Word address.
        addr: u8,
    },
}

impl Op {
    /// Packs the instruction into its 8-bit word.
    pub fn encode(self) -> u8 {
        let (op, reg, operand) = match self {
            Self::Load { rd, imm } => (OP_LOAD, rd, imm & OPERAND_MASK),
            Self::Add { rd, rs } => (OP_ADD, rd, (rs & REG_MASK) << SOURCE_SHIFT),
            Self::Sub { rd, rs } => (OP_SUB, rd, (rs & REG_MASK) << SOURCE_SHIFT),
            Self::Store { rs, addr } => (OP_STORE, rs, addr & OPERAND_MASK),
        };
        (op << OP_SHIFT) | ((reg & REG_MASK) << REG_SHIFT) | operand
    }

    /// Unpacks an 8-bit word.
    ///
    /// Returns `None` when reserved bits of `ADD`/`SUB` are set.
    pub fn decode(word: u8) -> Option<Self> {
        let op = word >> OP_SHIFT;
        let reg = (word >> REG_SHIFT) & REG_MASK;
        let operand = word & OPERAND_MASK;

        match op {
            OP_LOAD => Some(Self::Load { rd: reg, imm: operand }),
            OP_ADD | OP_SUB => {
                if operand & RESERVED_MASK != 0 {
                    return None;
                }
                let rs = operand >> SOURCE_SHIFT;
                if op == OP_ADD {
                    Some(Self::Add { rd: reg, rs })
                } else {
                    Some(Self::Sub { rd: reg, rs })
                }
            }
            OP_STORE => Some(Self::Store { rs: reg, addr: operand }),
            _ => None,
        }
    }
}

/// Returns the name of register number `idx`.
#[inline]
pub fn reg_name(idx: u8) -> &'static str {
    REGISTERS.get(idx as usize).copied().unwrap_or("R?")
}

impl fmt::Display for Op {
    /// Formats the instruction in assembler syntax, e.g. `LOAD R0,#5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Load { rd, imm } => write!(f, "LOAD {},#{}", reg_name(rd), imm),
            Self::Add { rd, rs } => write!(f, "ADD {},{}", reg_name(rd), reg_name(rs)),
            Self::Sub { rd, rs } => write!(f, "SUB {},{}", reg_name(rd), reg_name(rs)),
            Self::Store { rs, addr } => write!(f, "STORE {},[{}]", reg_name(rs), addr),
        }
    }
}

/// Disassembles an 8-bit word, or returns `"unknown"` for an invalid one.
pub fn disassemble(word: u8) -> String {
    Op::decode(word).map_or_else(|| "unknown".to_owned(), |op| op.to_string())
}
