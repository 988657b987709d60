//! Process and module lookup collaborator

use crate::core::types::{MemoryResult, ModuleInfo, PointerWidth, ProcessInfo};
use crate::memory::ProcessMemory;

/// Finds processes and modules and opens handles to them.
///
/// The session drives these steps strictly in order: find the process, open
/// it, find the module, then query the pointer width. Any failure aborts the
/// attach and drops whatever handle was already opened.
pub trait ProcessLookup {
    /// Open handle through which the target's memory is accessed
    type Handle: ProcessMemory;

    /// Find a running process by exact name.
    ///
    /// Fails with `ProcessNotFound` when nothing matches.
    fn find_process(&self, name: &str) -> MemoryResult<ProcessInfo>;

    /// Open a handle with rights for memory read/write and synchronization.
    ///
    /// Fails with `AccessDenied` or `OpenFailed`.
    fn open_process(&self, process: &ProcessInfo) -> MemoryResult<Self::Handle>;

    /// Find a module loaded in the process by exact name.
    ///
    /// Fails with `ModuleNotFound` when nothing matches.
    fn find_module(
        &self,
        process: &ProcessInfo,
        handle: &Self::Handle,
        name: &str,
    ) -> MemoryResult<ModuleInfo>;

    /// Pointer width of the opened target
    fn pointer_width(
        &self,
        _process: &ProcessInfo,
        _handle: &Self::Handle,
    ) -> MemoryResult<PointerWidth> {
        Ok(PointerWidth::native())
    }
}
