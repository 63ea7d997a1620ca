//! # Configuration Tests
//!
//! Defaults, JSON deserialization, and file loading of `EngineConfig`.

use std::io::Write;

use stepsim_core::config::{ConfigError, EngineConfig};

#[test]
fn test_config_default() {
    let config = EngineConfig::default();
    assert_eq!(config.max_steps, 10_000);
    assert_eq!(config.yield_every, 256);
    assert!(!config.trace_steps);
}

#[test]
fn test_empty_json_uses_defaults() {
    assert_eq!(
        EngineConfig::from_json_str("{}").unwrap(),
        EngineConfig::default()
    );
}

#[test]
fn test_full_json() {
    let config = EngineConfig::from_json_str(
        r#"{ "max_steps": 12, "yield_every": 3, "trace_steps": true }"#,
    )
    .unwrap();
    assert_eq!(
        config,
        EngineConfig {
            max_steps: 12,
            yield_every: 3,
            trace_steps: true,
        }
    );
}

#[test]
fn test_wrong_field_type_is_parse_error() {
    let err = EngineConfig::from_json_str(r#"{ "max_steps": "many" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("invalid config:"));
}

#[test]
fn test_negative_cap_is_parse_error() {
    assert!(EngineConfig::from_json_str(r#"{ "max_steps": -1 }"#).is_err());
}

#[test]
fn test_batch_size_never_zero() {
    let config = EngineConfig {
        yield_every: 0,
        ..EngineConfig::default()
    };
    assert_eq!(config.batch_size(), 1);
    assert_eq!(EngineConfig::default().batch_size(), 256);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "max_steps": 99 }}"#).unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_steps, 99);
    assert_eq!(config.yield_every, 256);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = EngineConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_config_serializes_back() {
    let json = serde_json::to_string(&EngineConfig::default()).unwrap();
    assert_eq!(EngineConfig::from_json_str(&json).unwrap(), EngineConfig::default());
}
