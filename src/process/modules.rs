//! Module enumeration through ToolHelp32 module snapshots

use crate::core::types::{Address, MemoryError, MemoryResult, ModuleInfo, ProcessId};
use crate::windows::utils::wide_to_string;
use std::mem;
use tracing::trace;
use windows::Win32::Foundation::{CloseHandle, ERROR_BAD_LENGTH, HANDLE};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W, TH32CS_SNAPMODULE,
    TH32CS_SNAPMODULE32,
};

/// Snapshot attempts before giving up on ERROR_BAD_LENGTH
const SNAPSHOT_RETRIES: usize = 4;

/// Iterates the modules of one process, 32-bit modules included
pub struct ModuleEnumerator {
    snapshot: HANDLE,
    pid: ProcessId,
    first_called: bool,
}

impl ModuleEnumerator {
    /// Take a module snapshot of process `pid`
    pub fn new(pid: ProcessId) -> MemoryResult<Self> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid) } {
                Ok(snapshot) => {
                    return Ok(ModuleEnumerator {
                        snapshot,
                        pid,
                        first_called: false,
                    })
                }
                // The loader list was changing under the snapshot
                Err(e) if e.code() == ERROR_BAD_LENGTH.to_hresult() && attempt < SNAPSHOT_RETRIES => {
                    trace!(pid, attempt, "module snapshot raced the loader, retrying");
                }
                Err(e) => return Err(MemoryError::from(e)),
            }
        }
    }

    /// Process whose modules are enumerated
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    fn next_module(&mut self) -> Option<ModuleInfo> {
        unsafe {
            let mut entry: MODULEENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<MODULEENTRY32W>() as u32;

            let result = if !self.first_called {
                self.first_called = true;
                Module32FirstW(self.snapshot, &mut entry)
            } else {
                Module32NextW(self.snapshot, &mut entry)
            };

            if result.is_err() {
                return None;
            }

            Some(ModuleInfo::new(
                wide_to_string(&entry.szModule),
                Address::new(entry.modBaseAddr as usize),
                entry.modBaseSize as usize,
            ))
        }
    }
}

impl Drop for ModuleEnumerator {
    fn drop(&mut self) {
        if !self.snapshot.is_invalid() {
            unsafe {
                let _ = CloseHandle(self.snapshot);
            }
        }
    }
}

impl Iterator for ModuleEnumerator {
    type Item = ModuleInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_module()
    }
}

/// Enumerate modules for a specific process
pub fn enumerate_modules(pid: ProcessId) -> MemoryResult<Vec<ModuleInfo>> {
    Ok(ModuleEnumerator::new(pid)?.collect())
}

/// Find a module of process `pid` whose name equals `name` exactly
pub fn find_module_by_name(pid: ProcessId, name: &str) -> MemoryResult<ModuleInfo> {
    ModuleEnumerator::new(pid)?
        .find(|m| m.name_matches(name))
        .ok_or_else(|| MemoryError::ModuleNotFound {
            module: name.to_string(),
            pid,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_exe_name() -> String {
        std::env::current_exe()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_enumerate_own_modules() {
        let modules = enumerate_modules(std::process::id()).unwrap();
        assert!(!modules.is_empty());
        assert!(modules.iter().all(|m| !m.base_address.is_null()));
    }

    #[test]
    fn test_main_module_contains_own_code() {
        let module = find_module_by_name(std::process::id(), &current_exe_name()).unwrap();
        let code = Address::new(test_main_module_contains_own_code as usize);
        assert!(module.contains_address(code));
    }

    #[test]
    fn test_missing_module() {
        let pid = std::process::id();
        assert!(matches!(
            find_module_by_name(pid, "no_such_module.dll"),
            Err(MemoryError::ModuleNotFound { pid: p, .. }) if p == pid
        ));
    }
}
