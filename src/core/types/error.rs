//! Error taxonomy for attach, transfer and pointer-chain operations

use super::{Address, ProcessId};
use std::fmt;
use thiserror::Error;

/// Direction of a single cross-process transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Read,
    Write,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Read => write!(f, "read"),
            TransferDirection::Write => write!(f, "write"),
        }
    }
}

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Module {module} not found in process {pid}")]
    ModuleNotFound { module: String, pid: ProcessId },

    #[error("Failed to open process {pid}: {reason}")]
    OpenFailed { pid: ProcessId, reason: String },

    #[error("Access denied to process {pid}{}: {reason}", at_address(.address))]
    AccessDenied {
        pid: ProcessId,
        address: Option<Address>,
        reason: String,
    },

    #[error("Invalid memory address: {0}")]
    InvalidAddress(Address),

    #[error("Partial {direction} at {address}: requested {requested} bytes, transferred {transferred}")]
    PartialTransfer {
        address: Address,
        direction: TransferDirection,
        requested: usize,
        transferred: usize,
    },

    #[error("Pointer chain unresolved at level {level} ({address}): {source}")]
    Unresolved {
        level: usize,
        address: Address,
        #[source]
        source: Box<MemoryError>,
    },

    #[error("Target process {0} is gone")]
    TargetGone(ProcessId),

    #[error("Offset chain must contain at least one offset")]
    EmptyChain,

    #[error("Transfer of {requested} bytes exceeds the limit of {limit}")]
    TransferTooLarge { requested: usize, limit: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Process memory access is only supported on Windows")]
    UnsupportedPlatform,

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsApiError(#[from] windows::core::Error),

    #[error("Windows API: {0}")]
    WindowsApi(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn at_address(address: &Option<Address>) -> String {
    address.map(|a| format!(" at {a}")).unwrap_or_default()
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates an access denied error for a process
    pub fn access_denied(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::AccessDenied {
            pid,
            address: None,
            reason: reason.into(),
        }
    }

    /// Creates an access denied error for one address of a process
    pub fn access_denied_at(pid: ProcessId, address: Address, reason: impl Into<String>) -> Self {
        MemoryError::AccessDenied {
            pid,
            address: Some(address),
            reason: reason.into(),
        }
    }

    /// Creates an open failed error
    pub fn open_failed(pid: ProcessId, reason: impl Into<String>) -> Self {
        MemoryError::OpenFailed {
            pid,
            reason: reason.into(),
        }
    }

    /// Wraps the error of a failing hop into an unresolved chain error
    pub fn unresolved(level: usize, address: Address, source: MemoryError) -> Self {
        MemoryError::Unresolved {
            level,
            address,
            source: Box::new(source),
        }
    }

    /// True when the target process has exited
    pub fn is_target_gone(&self) -> bool {
        match self {
            MemoryError::TargetGone(_) => true,
            MemoryError::Unresolved { source, .. } => source.is_target_gone(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = MemoryError::InvalidAddress(Address::new(0xDEADBEEF));
        assert_eq!(err.to_string(), "Invalid memory address: 0xDEADBEEF");

        let err = MemoryError::access_denied(1234, "missing PROCESS_VM_READ");
        assert_eq!(
            err.to_string(),
            "Access denied to process 1234: missing PROCESS_VM_READ"
        );

        let err = MemoryError::access_denied_at(1234, Address::new(0x1000), "page guard");
        assert_eq!(
            err.to_string(),
            "Access denied to process 1234 at 0x1000: page guard"
        );
    }

    #[test]
    fn test_all_error_variants() {
        let errors: Vec<(MemoryError, &str)> = vec![
            (
                MemoryError::ProcessNotFound("game.exe".to_string()),
                "Process not found: game.exe",
            ),
            (
                MemoryError::ModuleNotFound {
                    module: "client.dll".to_string(),
                    pid: 42,
                },
                "Module client.dll not found in process 42",
            ),
            (
                MemoryError::open_failed(7, "invalid parameter"),
                "Failed to open process 7: invalid parameter",
            ),
            (
                MemoryError::PartialTransfer {
                    address: Address::new(0x2000),
                    direction: TransferDirection::Read,
                    requested: 8,
                    transferred: 3,
                },
                "Partial read at 0x2000: requested 8 bytes, transferred 3",
            ),
            (MemoryError::TargetGone(99), "Target process 99 is gone"),
            (
                MemoryError::EmptyChain,
                "Offset chain must contain at least one offset",
            ),
            (
                MemoryError::TransferTooLarge {
                    requested: 100,
                    limit: 50,
                },
                "Transfer of 100 bytes exceeds the limit of 50",
            ),
            (
                MemoryError::UnsupportedPlatform,
                "Process memory access is only supported on Windows",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_unresolved_keeps_source() {
        let err = MemoryError::unresolved(
            1,
            Address::new(0x500020),
            MemoryError::InvalidAddress(Address::new(0x500020)),
        );
        assert_eq!(
            err.to_string(),
            "Pointer chain unresolved at level 1 (0x500020): Invalid memory address: 0x500020"
        );
        let source = err.source().expect("source is kept");
        assert_eq!(source.to_string(), "Invalid memory address: 0x500020");
    }

    #[test]
    fn test_is_target_gone() {
        assert!(MemoryError::TargetGone(1).is_target_gone());
        assert!(MemoryError::unresolved(0, Address::null(), MemoryError::TargetGone(1))
            .is_target_gone());
        assert!(!MemoryError::EmptyChain.is_target_gone());
    }

    #[test]
    fn test_from_implementations() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "test");
        let mem_err: MemoryError = io_err.into();
        assert!(matches!(mem_err, MemoryError::IoError(_)));

        let json_err = serde_json::from_str::<String>("invalid json").unwrap_err();
        let mem_err: MemoryError = json_err.into();
        assert!(matches!(mem_err, MemoryError::JsonError(_)));
    }
}
