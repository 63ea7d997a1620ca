//! # Compilation Stage Tests
//!
//! `compile_program` must call the plugin's compiler exactly once, pass its
//! errors through, and reject records that break the contract.

use pretty_assertions::assert_eq;
use stepsim_core::common::{CompileError, ContractViolation, EngineError, InstructionRecord};
use stepsim_core::plugin::MemoryLayout;
use stepsim_core::sim::compile_program;
use stepsim_core::sim::compiler::validate_records;

use crate::common::mocks::plugin::{descriptor, mock_plugin};

const LAYOUT: MemoryLayout = MemoryLayout {
    size: 16,
    word_size: 4,
};

fn rec(address: u64, encoding: &str) -> InstructionRecord {
    InstructionRecord::new(address, format!("op@{address}"), encoding)
}

#[test]
fn test_compile_called_once_with_source() {
    let mut plugin = mock_plugin(descriptor("m", &["A"], 16, 4));
    let records = vec![rec(0, "0001"), rec(1, "0010")];
    let returned = records.clone();
    let _ = plugin
        .expect_compile()
        .withf(|source| source == "A;")
        .times(1)
        .returning(move |_| Ok(returned.clone()));

    let program = compile_program(&plugin, "A;").unwrap();
    assert_eq!(program.instructions(), records.as_slice());
    assert_eq!(program.len(), 2);
    assert_eq!(program.layout(), LAYOUT);
    assert_eq!(program.listing(), vec!["0  0001  op@0", "1  0010  op@1"]);
}

#[test]
fn test_compile_error_passes_through() {
    let mut plugin = mock_plugin(descriptor("m", &["A"], 16, 4));
    let _ = plugin
        .expect_compile()
        .times(1)
        .returning(|_| Err(CompileError::at("bad token", 2, 5)));

    let err = compile_program(&plugin, "??").unwrap_err();
    assert_eq!(err, EngineError::Compile(CompileError::at("bad token", 2, 5)));
}

#[test]
fn test_invalid_descriptor_rejected_before_compile() {
    let mut plugin = mock_plugin(descriptor("m", &[], 16, 4));
    let _ = plugin.expect_compile().never();

    let err = compile_program(&plugin, "").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contract(ContractViolation::EmptyRegisterSet { .. })
    ));
}

#[test]
fn test_empty_program_accepted() {
    let mut plugin = mock_plugin(descriptor("m", &["A"], 16, 4));
    let _ = plugin.expect_compile().returning(|_| Ok(Vec::new()));

    let program = compile_program(&plugin, "").unwrap();
    assert!(program.is_empty());
    assert!(program.listing().is_empty());
}

#[test]
fn test_wrong_width_rejected() {
    let err = validate_records(&[rec(0, "0001"), rec(1, "00010")], LAYOUT).unwrap_err();
    assert_eq!(
        err,
        ContractViolation::EncodingWidth {
            index: 1,
            expected: 4,
            actual: 5,
        }
    );
}

#[test]
fn test_non_binary_rejected() {
    let err = validate_records(&[rec(0, "01x1")], LAYOUT).unwrap_err();
    assert_eq!(
        err,
        ContractViolation::EncodingNotBinary {
            index: 0,
            encoding: "01x1".into(),
        }
    );
}

#[test]
fn test_non_binary_reported_before_width() {
    let err = validate_records(&[rec(0, "2")], LAYOUT).unwrap_err();
    assert!(matches!(err, ContractViolation::EncodingNotBinary { .. }));
}

#[test]
fn test_decreasing_address_rejected() {
    let records = [rec(0, "0000"), rec(4, "0000"), rec(2, "0000")];
    assert_eq!(
        validate_records(&records, LAYOUT),
        Err(ContractViolation::AddressOrder {
            index: 2,
            address: 2,
            previous: 4,
        })
    );
}

#[test]
fn test_tied_and_gapped_addresses_accepted() {
    let records = [rec(0, "0000"), rec(0, "0001"), rec(8, "0010")];
    assert_eq!(validate_records(&records, LAYOUT), Ok(()));
}

#[test]
fn test_invalid_records_fail_compile_program() {
    let mut plugin = mock_plugin(descriptor("m", &["A"], 16, 4));
    let _ = plugin
        .expect_compile()
        .returning(|_| Ok(vec![rec(0, "000")]));

    let err = compile_program(&plugin, "x").unwrap_err();
    assert!(matches!(
        err,
        EngineError::Contract(ContractViolation::EncodingWidth { .. })
    ));
}
