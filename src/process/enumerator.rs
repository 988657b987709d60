//! Process enumeration using Windows ToolHelp32 API

use crate::core::types::{MemoryError, MemoryResult, ProcessInfo};
use crate::windows::types::Handle;
use crate::windows::utils::{wide_to_string, ErrorCode};
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

/// Process enumerator using ToolHelp32 API
pub struct ProcessEnumerator {
    snapshot: Handle,
    first_called: bool,
}

impl ProcessEnumerator {
    /// Take a snapshot of the running processes
    pub fn new() -> MemoryResult<Self> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if snapshot.is_null() || snapshot == INVALID_HANDLE_VALUE {
            return Err(MemoryError::WindowsApi(format!(
                "Failed to create process snapshot: {}",
                ErrorCode::last_error()
            )));
        }
        Ok(ProcessEnumerator {
            snapshot: Handle::new(snapshot),
            first_called: false,
        })
    }

    fn next_process(&mut self) -> Option<ProcessInfo> {
        unsafe {
            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

            let success = if !self.first_called {
                self.first_called = true;
                Process32FirstW(self.snapshot.raw(), &mut entry)
            } else {
                Process32NextW(self.snapshot.raw(), &mut entry)
            };

            if success == FALSE {
                return None;
            }

            Some(ProcessInfo::new(
                entry.th32ProcessID,
                wide_to_string(&entry.szExeFile),
            ))
        }
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_process()
    }
}

/// Enumerate all running processes
pub fn enumerate_processes() -> MemoryResult<Vec<ProcessInfo>> {
    Ok(ProcessEnumerator::new()?.collect())
}

/// Find the first process whose executable name equals `name` exactly
pub fn find_process_by_name(name: &str) -> MemoryResult<ProcessInfo> {
    ProcessEnumerator::new()?
        .find(|p| p.name_matches(name))
        .ok_or_else(|| MemoryError::ProcessNotFound(name.to_string()))
}
