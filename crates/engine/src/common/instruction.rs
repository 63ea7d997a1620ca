//! Instruction records produced by a plugin's compiler.

use serde::{Deserialize, Serialize};

use super::addr::format_address;

/// One compiled, addressable instruction.
///
/// Records are immutable once the compilation stage accepts them. The engine
/// never interprets `text`; `encoding` is checked for width and alphabet only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionRecord {
    /// Address of the instruction in the plugin's memory, in words.
    pub address: u64,
    /// Human-readable mnemonic form, e.g. `LOAD R0,#5`.
    pub text: String,
    /// Binary encoding as a string of `'0'`/`'1'`, `word_size` characters long.
    pub encoding: String,
}

impl InstructionRecord {
    /// Creates a new instruction record.
    pub fn new(address: u64, text: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            address,
            text: text.into(),
            encoding: encoding.into(),
        }
    }

    /// Parses the encoding back into an integer, most significant bit first.
    ///
    /// Returns `None` if the encoding is empty, wider than 64 bits, or
    /// contains characters other than `'0'` and `'1'`.
    pub fn encoding_bits(&self) -> Option<u64> {
        if self.encoding.is_empty() || self.encoding.len() > 64 {
            return None;
        }
        self.encoding.chars().try_fold(0u64, |acc, c| match c {
            '0' => Some(acc << 1),
            '1' => Some((acc << 1) | 1),
            _ => None,
        })
    }

    /// Formats one listing line: padded hex address, encoding, then text.
    pub fn listing_line(&self, memory_size: usize) -> String {
        format!(
            "{}  {}  {}",
            format_address(self.address, memory_size),
            self.encoding,
            self.text
        )
    }
}

/// Formats `value` as a bit string of exactly `width` characters.
///
/// Bits above `width` are discarded; `width` is capped at 64.
pub fn to_bit_string(value: u64, width: u32) -> String {
    let width = width.min(64);
    (0..width)
        .rev()
        .map(|bit| if (value >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}
