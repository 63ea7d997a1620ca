//! Reference instruction sets.
//!
//! Processor plugins normally live outside this crate. The ones here are
//! small, complete implementations of [`ProcessorPlugin`](crate::plugin::ProcessorPlugin)
//! used by the command-line front end and the test suite.
//!
//! # Processors
//!
//! * `mini8`: 8-bit, two registers, four words of memory.

/// The mini8 teaching processor.
pub mod mini8;

use std::sync::Arc;

use crate::plugin::{PluginRegistry, RegistryError};

/// Returns a registry holding every built-in processor, in a stable order.
///
/// # Errors
///
/// Returns a `RegistryError` if two built-ins share an id.
pub fn builtin_registry() -> Result<PluginRegistry, RegistryError> {
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(mini8::Mini8::new()))?;
    Ok(registry)
}
