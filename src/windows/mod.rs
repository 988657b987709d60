//! Windows API layer for process memory access
//!
//! Provides safe wrappers around the Win32 calls the crate needs. All
//! unsafe FFI calls are contained within this module.

pub mod bindings;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::Handle;
pub use utils::ErrorCode;

// Re-export key bindings
pub use bindings::kernel32;
