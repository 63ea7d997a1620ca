//! # Error Tests
//!
//! Display text and conversions of the engine error types.

use stepsim_core::common::{CompileError, ContractViolation, EngineError, ExecutionError};

#[test]
fn test_compile_error_with_position_display() {
    let err = CompileError::at("undeclared variable 'x'", 3, 7);
    assert_eq!(err.to_string(), "3:7: undeclared variable 'x'");
}

#[test]
fn test_compile_error_without_position_display() {
    let err = CompileError::new("empty program");
    assert!(err.pos.is_none());
    assert_eq!(err.to_string(), "empty program");
}

#[test]
fn test_execution_error_display() {
    assert_eq!(ExecutionError::new("bad opcode").to_string(), "bad opcode");
}

#[test]
fn test_engine_error_from_compile_error() {
    let err: EngineError = CompileError::at("boom", 1, 1).into();
    assert!(matches!(err, EngineError::Compile(_)));
    assert_eq!(err.to_string(), "compile error: 1:1: boom");
}

#[test]
fn test_engine_error_from_contract_violation() {
    let err: EngineError = ContractViolation::EncodingWidth {
        index: 2,
        expected: 8,
        actual: 7,
    }
    .into();
    assert!(matches!(err, EngineError::Contract(_)));
    assert_eq!(
        err.to_string(),
        "contract violation: instruction 2 encoding has 7 bits, expected 8"
    );
}

#[test]
fn test_address_order_display_is_hex() {
    let err = ContractViolation::AddressOrder {
        index: 1,
        address: 0x2,
        previous: 0x10,
    };
    assert_eq!(
        err.to_string(),
        "instruction 1 address 0x2 precedes previous address 0x10"
    );
}

#[test]
fn test_step_out_of_range_display() {
    let err = EngineError::StepOutOfRange {
        requested: 9,
        last: 4,
    };
    assert_eq!(err.to_string(), "step 9 is outside history (last step 4)");
}

#[test]
fn test_not_loaded_display() {
    assert_eq!(EngineError::NotLoaded.to_string(), "no program loaded");
}
