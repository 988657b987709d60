//! Core type definitions for memaccess
//!
//! Address wrappers, pointer widths, scalar kinds, process/module identity
//! and the error taxonomy shared by every layer.

mod address;
mod error;
mod pointer;
mod process_info;
mod scalar;

// Re-export all public types
pub use address::Address;
pub(crate) use address::parse_usize;
pub use error::{MemoryError, MemoryResult, TransferDirection};
pub use pointer::PointerWidth;
pub use process_info::{ModuleInfo, ProcessInfo};
pub use scalar::{Scalar, ScalarKind, ScalarValue};

// Common type aliases
pub type ProcessId = u32;
pub type Offset = usize;
