//! # Unit Components
//!
//! Tests for each engine component, from value types up to the step controller.


/// Unit tests for `EngineConfig` defaults and JSON loading.
pub mod config;




/// Unit tests for statistics derived from history.
pub mod stats;
