//! Safe process handle wrapper with RAII semantics

use crate::core::types::{Address, MemoryError, MemoryResult, PointerWidth, ProcessId};
use crate::memory::ProcessMemory;
use crate::windows::bindings::kernel32::{self, TransferFailure};
use crate::windows::types::Handle;
use crate::windows::utils::ErrorCode;
use std::fmt;
use tracing::trace;
use winapi::um::winnt::HANDLE;

/// Access rights for process handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// Read memory access
    pub const VM_READ: Self = Self { value: 0x0010 };
    /// Write memory access
    pub const VM_WRITE: Self = Self { value: 0x0020 };
    /// Memory operations required alongside writes
    pub const VM_OPERATION: Self = Self { value: 0x0008 };
    /// Limited query access, enough for the WoW64 check
    pub const QUERY_LIMITED_INFORMATION: Self = Self { value: 0x1000 };
    /// Wait on the process object to poll for exit
    pub const SYNCHRONIZE: Self = Self { value: 0x0010_0000 };
    /// Everything a memory session needs
    pub const SESSION: Self = Self {
        value: kernel32::SESSION_ACCESS,
    };

    /// Combine access rights
    pub fn combine(rights: &[Self]) -> Self {
        let mut value = 0;
        for right in rights {
            value |= right.value;
        }
        Self { value }
    }

    /// Get raw value
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Open handle to a target process, closed when dropped
pub struct ProcessHandle {
    handle: Handle,
    pid: ProcessId,
    access: ProcessAccess,
}

impl ProcessHandle {
    /// Open a process with specified access rights
    pub fn open(pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        match kernel32::open_process(pid, access.value()) {
            Ok(raw) => Ok(ProcessHandle {
                handle: Handle::new(raw),
                pid,
                access,
            }),
            Err(ErrorCode::AccessDenied) => Err(MemoryError::access_denied(
                pid,
                ErrorCode::AccessDenied.to_string(),
            )),
            Err(code) => Err(MemoryError::open_failed(pid, code.to_string())),
        }
    }

    /// Open a process for a read/write memory session
    pub fn open_for_session(pid: ProcessId) -> MemoryResult<Self> {
        Self::open(pid, ProcessAccess::SESSION)
    }

    /// Get the process ID
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Get the raw handle
    ///
    /// # Safety
    /// The returned handle is only valid as long as this ProcessHandle exists
    pub unsafe fn raw(&self) -> HANDLE {
        self.handle.raw()
    }

    /// Get the access rights
    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    /// Check if handle is valid
    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }

    /// Whether the target process has terminated
    pub fn has_exited(&self) -> MemoryResult<bool> {
        unsafe { kernel32::has_exited(self.handle.raw()) }
    }

    /// Pointer width of the target, 32-bit when it runs under WoW64
    pub fn pointer_width(&self) -> MemoryResult<PointerWidth> {
        let wow64 = unsafe { kernel32::is_wow64_process(self.handle.raw())? };
        Ok(if wow64 {
            PointerWidth::Bits32
        } else {
            PointerWidth::native()
        })
    }

    fn transfer_error(&self, address: Address, failure: TransferFailure) -> MemoryError {
        if matches!(self.has_exited(), Ok(true)) {
            return MemoryError::TargetGone(self.pid);
        }
        match failure.code {
            ErrorCode::AccessDenied => {
                MemoryError::access_denied_at(self.pid, address, failure.code.to_string())
            }
            code if code.is_bad_address() => MemoryError::InvalidAddress(address),
            code => MemoryError::WindowsApi(format!(
                "memory transfer at {} failed: {}",
                address, code
            )),
        }
    }
}

impl ProcessMemory for ProcessHandle {
    fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        match unsafe { kernel32::read_process_memory(self.handle.raw(), address.as_usize(), buffer) }
        {
            Ok(read) => Ok(read),
            // A partial copy that moved some bytes is reported as a short count
            Err(failure) if failure.code == ErrorCode::PartialCopy && failure.transferred > 0 => {
                trace!(pid = self.pid, %address, transferred = failure.transferred, "partial read");
                Ok(failure.transferred)
            }
            Err(failure) => Err(self.transfer_error(address, failure)),
        }
    }

    fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        match unsafe { kernel32::write_process_memory(self.handle.raw(), address.as_usize(), data) }
        {
            Ok(written) => Ok(written),
            Err(failure) if failure.code == ErrorCode::PartialCopy && failure.transferred > 0 => {
                trace!(pid = self.pid, %address, transferred = failure.transferred, "partial write");
                Ok(failure.transferred)
            }
            Err(failure) => Err(self.transfer_error(address, failure)),
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("valid", &self.is_valid())
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessHandle(pid={}, valid={})",
            self.pid,
            self.is_valid()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryAccessor;

    #[test]
    fn test_session_access_combines_rights() {
        let combined = ProcessAccess::combine(&[
            ProcessAccess::VM_READ,
            ProcessAccess::VM_WRITE,
            ProcessAccess::VM_OPERATION,
            ProcessAccess::QUERY_LIMITED_INFORMATION,
            ProcessAccess::SYNCHRONIZE,
        ]);
        assert_eq!(combined, ProcessAccess::SESSION);
        assert_eq!(combined.value(), 0x0010_1038);
    }

    #[test]
    fn test_open_invalid_pid() {
        // PID 0 is the idle process and cannot be opened
        assert!(ProcessHandle::open_for_session(0).is_err());
    }

    #[test]
    fn test_current_process_round_trip() {
        let handle = ProcessHandle::open_for_session(std::process::id()).unwrap();
        assert!(handle.is_valid());
        assert!(!handle.has_exited().unwrap());
        assert_eq!(handle.pointer_width().unwrap(), PointerWidth::native());

        let mut value: u32 = 7;
        let address = Address::new(&mut value as *mut u32 as usize);
        let accessor = MemoryAccessor::new(&handle);
        accessor.write::<u32>(address, 99).unwrap();
        assert_eq!(accessor.read::<u32>(address).unwrap(), 99);
    }

    #[test]
    fn test_unmapped_read_is_invalid_address() {
        let handle = ProcessHandle::open_for_session(std::process::id()).unwrap();
        let mut buffer = [0u8; 4];
        assert!(matches!(
            handle.read_memory(Address::null(), &mut buffer),
            Err(MemoryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_display() {
        let handle = ProcessHandle::open_for_session(std::process::id()).unwrap();
        assert!(handle.to_string().contains("valid=true"));
    }
}
