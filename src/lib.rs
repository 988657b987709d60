//! memaccess: read, write and walk pointer chains in another process's memory
//!
//! Attach a [`Session`] to a process and one of its modules, then move
//! fixed-size scalars in and out of the target or resolve offset chains from
//! the module base. The OS layer is Windows-only; [`SimulatedSystem`] and
//! [`SimulatedProcess`] stand in for it everywhere else.

pub mod cli;
pub mod config;
pub mod core;
pub mod memory;
pub mod process;
pub mod session;
#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use core::types::{
    Address, MemoryError, MemoryResult, ModuleInfo, Offset, PointerWidth, ProcessId, ProcessInfo,
    Scalar, ScalarKind, ScalarValue, TransferDirection,
};

pub use memory::{
    ChainHop, ChainResolver, MemoryAccessor, OffsetChain, ProcessMemory, Protection,
    ResolvedChain, SimulatedProcess,
};
pub use process::{ProcessLookup, SimulatedSystem};
pub use session::{AttachOptions, Session};

#[cfg(windows)]
pub use process::{ProcessHandle, SystemLookup};
#[cfg(windows)]
pub use session::SystemSession;

// Re-export core directly for full access
pub use core::{AUTHORS, VERSION};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(AUTHORS, env!("CARGO_PKG_AUTHORS"));
    }

    #[test]
    fn test_address_reexport() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_usize(), 0x1000);
        assert!(Address::null().is_null());
    }

    #[test]
    fn test_module_info_reexport() {
        let module = ModuleInfo::new("kernel32.dll", Address::new(0x10000), 0x1000);
        assert_eq!(module.base_address, Address::new(0x10000));
        assert!(module.contains_address(Address::new(0x10500)));
    }

    #[test]
    fn test_memory_error_reexport() {
        let error = MemoryError::ProcessNotFound("notepad.exe".to_string());
        assert!(error.to_string().contains("notepad.exe"));
    }

    #[test]
    fn test_session_reexport() {
        let mut system = SimulatedSystem::new();
        let memory = system.add_process(7, "tool.exe");
        system.add_module(7, "tool.exe", Address::new(0x10000), 0x100);
        memory.map_region(Address::new(0x10000), 0x100);

        let session = Session::attach_with(&system, "tool.exe", "tool.exe").unwrap();
        session.write::<u16>(Address::new(0x10002), 0xBEEF).unwrap();
        assert_eq!(session.read::<u16>(Address::new(0x10002)).unwrap(), 0xBEEF);
    }
}
