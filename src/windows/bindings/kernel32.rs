//! Kernel32.dll bindings for process and memory operations

use crate::core::types::{MemoryError, MemoryResult};
use crate::windows::utils::ErrorCode;
use winapi::shared::minwindef::{BOOL, DWORD, FALSE, LPCVOID, LPVOID};
use winapi::shared::winerror::WAIT_TIMEOUT;
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::synchapi::WaitForSingleObject;
use winapi::um::winbase::WAIT_OBJECT_0;
use winapi::um::winnt::{
    HANDLE, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
    PROCESS_VM_WRITE, SYNCHRONIZE,
};
use winapi::um::wow64apiset::IsWow64Process;

/// Rights needed to read, write and poll a target for exit
pub const SESSION_ACCESS: DWORD = PROCESS_VM_READ
    | PROCESS_VM_WRITE
    | PROCESS_VM_OPERATION
    | PROCESS_QUERY_LIMITED_INFORMATION
    | SYNCHRONIZE;

/// A failed memory transfer with the bytes moved before the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFailure {
    pub code: ErrorCode,
    pub transferred: usize,
}

/// Safe wrapper for OpenProcess
pub fn open_process(pid: u32, desired_access: DWORD) -> Result<HANDLE, ErrorCode> {
    unsafe {
        let handle = OpenProcess(desired_access, FALSE, pid);
        if handle.is_null() {
            Err(ErrorCode::last_error())
        } else {
            Ok(handle)
        }
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle
pub unsafe fn close_handle(handle: HANDLE) -> MemoryResult<()> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(MemoryError::WindowsApi(format!(
            "Failed to close handle: {}",
            ErrorCode::last_error()
        )))
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_VM_READ
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: usize,
    buffer: &mut [u8],
) -> Result<usize, TransferFailure> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE {
        Err(TransferFailure {
            code: ErrorCode::last_error(),
            transferred: bytes_read,
        })
    } else {
        Ok(bytes_read)
    }
}

/// Safe wrapper for WriteProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_VM_WRITE and
/// PROCESS_VM_OPERATION
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: usize,
    data: &[u8],
) -> Result<usize, TransferFailure> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    if result == FALSE {
        Err(TransferFailure {
            code: ErrorCode::last_error(),
            transferred: bytes_written,
        })
    } else {
        Ok(bytes_written)
    }
}

/// Whether the process behind `handle` has terminated.
///
/// # Safety
/// The handle must be a valid process handle with SYNCHRONIZE
pub unsafe fn has_exited(handle: HANDLE) -> MemoryResult<bool> {
    match WaitForSingleObject(handle, 0) {
        WAIT_OBJECT_0 => Ok(true),
        WAIT_TIMEOUT => Ok(false),
        _ => Err(MemoryError::WindowsApi(format!(
            "WaitForSingleObject failed: {}",
            ErrorCode::last_error()
        ))),
    }
}

/// Whether the process runs under WoW64 (a 32-bit process on 64-bit Windows)
///
/// # Safety
/// The handle must be a valid process handle with
/// PROCESS_QUERY_LIMITED_INFORMATION
pub unsafe fn is_wow64_process(handle: HANDLE) -> MemoryResult<bool> {
    let mut wow64: BOOL = FALSE;
    if IsWow64Process(handle, &mut wow64) == FALSE {
        Err(MemoryError::WindowsApi(format!(
            "IsWow64Process failed: {}",
            ErrorCode::last_error()
        )))
    } else {
        Ok(wow64 != FALSE)
    }
}
