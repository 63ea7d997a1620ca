//! Instruction address rendering.
//!
//! Addresses are stored as plain integers. Viewers see them as zero-padded
//! hexadecimal whose width is just enough to index every word of memory.

/// Returns the number of hex digits needed to address `memory_size` words.
///
/// This is `ceil(log16(memory_size))`, with a minimum of one digit.
///
/// # Arguments
///
/// * `memory_size` - Memory size in words.
pub fn address_width(memory_size: usize) -> usize {
    let mut width = 0;
    let mut span: u128 = 1;
    while span < memory_size as u128 {
        span *= 16;
        width += 1;
    }
    width.max(1)
}

/// Formats `address` as zero-padded lowercase hex for a memory of `memory_size` words.
///
/// Addresses wider than the computed width are printed in full rather than truncated.
///
/// # Arguments
///
/// * `address` - The instruction address.
/// * `memory_size` - Memory size in words.
pub fn format_address(address: u64, memory_size: usize) -> String {
    format!("{:0width$x}", address, width = address_width(memory_size))
}
