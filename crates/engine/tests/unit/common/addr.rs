//! # Address Formatting Tests
//!
//! Verifies the hex width derived from memory size and the padded rendering.

use rstest::rstest;
use stepsim_core::common::{address_width, format_address};

#[rstest]
#[case(0, 1)]
#[case(1, 1)]
#[case(4, 1)]
#[case(16, 1)]
#[case(17, 2)]
#[case(256, 2)]
#[case(257, 3)]
#[case(65_536, 4)]
fn test_address_width(#[case] memory_size: usize, #[case] expected: usize) {
    assert_eq!(address_width(memory_size), expected);
}

#[rstest]
#[case(0, 4, "0")]
#[case(3, 4, "3")]
#[case(0xa, 256, "0a")]
#[case(0xff, 256, "ff")]
#[case(0x1f, 4096, "01f")]
fn test_format_address(#[case] address: u64, #[case] memory_size: usize, #[case] expected: &str) {
    assert_eq!(format_address(address, memory_size), expected);
}

#[test]
fn test_format_address_wider_than_memory_is_not_truncated() {
    assert_eq!(format_address(0x123, 16), "123");
}
