//! [`ProcessLookup`] backed by the live Windows process table

use super::enumerator::find_process_by_name;
use super::handle::ProcessHandle;
use super::modules::find_module_by_name;
use super::ProcessLookup;
use crate::core::types::{MemoryResult, ModuleInfo, PointerWidth, ProcessInfo};

/// Looks up processes and modules with ToolHelp32 snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl ProcessLookup for SystemLookup {
    type Handle = ProcessHandle;

    fn find_process(&self, name: &str) -> MemoryResult<ProcessInfo> {
        find_process_by_name(name)
    }

    fn open_process(&self, process: &ProcessInfo) -> MemoryResult<ProcessHandle> {
        ProcessHandle::open_for_session(process.pid)
    }

    fn find_module(
        &self,
        process: &ProcessInfo,
        _handle: &ProcessHandle,
        name: &str,
    ) -> MemoryResult<ModuleInfo> {
        find_module_by_name(process.pid, name)
    }

    fn pointer_width(
        &self,
        _process: &ProcessInfo,
        handle: &ProcessHandle,
    ) -> MemoryResult<PointerWidth> {
        handle.pointer_width()
    }
}
