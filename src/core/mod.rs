//! Core module containing fundamental types for memaccess
//!
//! This module provides the foundational building blocks used throughout
//! the crate: address handling, scalar kinds, process and module
//! identity, and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemoryError, MemoryResult, ModuleInfo, PointerWidth, ProcessInfo, Scalar,
    ScalarKind, ScalarValue,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
