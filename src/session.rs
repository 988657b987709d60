//! Attached process sessions
//!
//! A [`Session`] owns one open process handle together with the base address
//! of one module inside that process. Every read, write and chain resolution
//! goes through the session, so the handle and base never travel separately.

use crate::core::types::{
    Address, MemoryResult, ModuleInfo, Offset, PointerWidth, ProcessInfo, Scalar, ScalarKind,
    ScalarValue,
};
use crate::memory::{ChainResolver, MemoryAccessor, OffsetChain, ProcessMemory, ResolvedChain};
use crate::process::ProcessLookup;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Default upper bound for a single transfer
pub const DEFAULT_MAX_TRANSFER_SIZE: usize = 16 * 1024 * 1024;

/// Options for attaching a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachOptions {
    /// Force a pointer width instead of asking the target
    pub pointer_width: Option<PointerWidth>,
    /// Reject transfers larger than this many bytes
    pub max_transfer_size: Option<usize>,
}

impl Default for AttachOptions {
    fn default() -> Self {
        AttachOptions {
            pointer_width: None,
            max_transfer_size: Some(DEFAULT_MAX_TRANSFER_SIZE),
        }
    }
}

/// One open process handle bound to one module base address.
///
/// The handle is released exactly once, by [`Session::close`] or on drop.
pub struct Session<H> {
    handle: H,
    process: ProcessInfo,
    module: ModuleInfo,
    width: PointerWidth,
    max_transfer_size: Option<usize>,
}

impl<H: ProcessMemory> Session<H> {
    /// Attach through `lookup` with default options
    pub fn attach_with<L>(lookup: &L, process: &str, module: &str) -> MemoryResult<Self>
    where
        L: ProcessLookup<Handle = H>,
    {
        Self::attach_with_options(lookup, process, module, &AttachOptions::default())
    }

    /// Attach through `lookup`.
    ///
    /// Steps run in order: find the process, open it, find the module, then
    /// settle the pointer width. The first failure is returned and any handle
    /// opened so far is dropped before returning.
    pub fn attach_with_options<L>(
        lookup: &L,
        process: &str,
        module: &str,
        options: &AttachOptions,
    ) -> MemoryResult<Self>
    where
        L: ProcessLookup<Handle = H>,
    {
        let process = lookup.find_process(process)?;
        debug!(pid = process.pid, name = %process.name, "found process");

        let handle = lookup.open_process(&process)?;
        debug!(pid = process.pid, "opened process handle");

        let module = lookup.find_module(&process, &handle, module)?;
        debug!(
            pid = process.pid,
            module = %module.name,
            base = %module.base_address,
            "found module"
        );

        let width = match options.pointer_width {
            Some(width) => width,
            None => lookup.pointer_width(&process, &handle)?,
        };
        debug!(pid = process.pid, %width, "session attached");

        Ok(Session {
            handle,
            process,
            module,
            width,
            max_transfer_size: options.max_transfer_size,
        })
    }

    /// The attached process
    pub fn process(&self) -> &ProcessInfo {
        &self.process
    }

    /// The module the session is keyed to
    pub fn module(&self) -> &ModuleInfo {
        &self.module
    }

    /// Base address of the module in the target
    pub fn base(&self) -> Address {
        self.module.base_address
    }

    /// Pointer width used for pointer reads and chain hops
    pub fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    /// The open handle
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Typed accessor over the session's handle
    pub fn accessor(&self) -> MemoryAccessor<'_, H> {
        let accessor = MemoryAccessor::new(&self.handle);
        match self.max_transfer_size {
            Some(limit) => accessor.with_limit(limit),
            None => accessor,
        }
    }

    /// Chain resolver at the session's pointer width
    pub fn resolver(&self) -> ChainResolver<'_, H> {
        ChainResolver::new(self.accessor(), self.width)
    }

    /// Read exactly `size` bytes at `address`
    pub fn read_raw(&self, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        self.accessor().read_raw(address, size)
    }

    /// Write all of `data` at `address`
    pub fn write_raw(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.accessor().write_raw(address, data)
    }

    pub fn read<T: Scalar>(&self, address: Address) -> MemoryResult<T> {
        self.accessor().read(address)
    }

    pub fn write<T: Scalar>(&self, address: Address, value: T) -> MemoryResult<()> {
        self.accessor().write(address, value)
    }

    /// Read a pointer at the session's pointer width
    pub fn read_pointer(&self, address: Address) -> MemoryResult<Address> {
        self.accessor().read_pointer(address, self.width)
    }

    /// Write a pointer at the session's pointer width
    pub fn write_pointer(&self, address: Address, value: Address) -> MemoryResult<()> {
        self.accessor().write_pointer(address, self.width, value)
    }

    /// Read a runtime-tagged scalar; `usize` follows the session's pointer width
    pub fn read_value(&self, address: Address, kind: ScalarKind) -> MemoryResult<ScalarValue> {
        self.accessor().read_value(address, kind, self.width)
    }

    pub fn write_value(&self, address: Address, value: ScalarValue) -> MemoryResult<()> {
        self.accessor().write_value(address, value, self.width)
    }

    /// Resolve `chain` from the module base
    pub fn resolve_chain(&self, chain: &OffsetChain) -> MemoryResult<Address> {
        self.resolver().resolve(self.base(), chain)
    }

    /// Resolve a raw offset slice from the module base
    pub fn resolve_offsets(&self, offsets: &[Offset]) -> MemoryResult<Address> {
        self.resolver().resolve_offsets(self.base(), offsets)
    }

    /// Resolve `chain` from the module base, reporting every hop
    pub fn resolve_traced(&self, chain: &OffsetChain) -> MemoryResult<ResolvedChain> {
        self.resolver().resolve_traced(self.base(), chain)
    }

    /// Resolve `chain` and read a scalar at the target
    pub fn read_chain<T: Scalar>(&self, chain: &OffsetChain) -> MemoryResult<T> {
        let target = self.resolve_chain(chain)?;
        self.read(target)
    }

    /// Resolve `chain` and write a scalar at the target
    pub fn write_chain<T: Scalar>(&self, chain: &OffsetChain, value: T) -> MemoryResult<()> {
        let target = self.resolve_chain(chain)?;
        self.write(target, value)
    }

    /// Release the handle now
    pub fn close(self) {
        debug!(pid = self.process.pid, "closing session");
        drop(self);
    }
}

impl<H> fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("process", &self.process)
            .field("module", &self.module)
            .field("pointer_width", &self.width)
            .field("max_transfer_size", &self.max_transfer_size)
            .finish()
    }
}

#[cfg(windows)]
mod system {
    use super::{AttachOptions, Session};
    use crate::core::types::MemoryResult;
    use crate::process::{ProcessHandle, SystemLookup};

    /// A session over a live Windows process
    pub type SystemSession = Session<ProcessHandle>;

    impl Session<ProcessHandle> {
        /// Attach to a running process by executable and module name
        pub fn attach(process: &str, module: &str) -> MemoryResult<Self> {
            Self::attach_with(&SystemLookup, process, module)
        }

        /// Attach to a running process with explicit options
        pub fn attach_with_config(
            process: &str,
            module: &str,
            options: &AttachOptions,
        ) -> MemoryResult<Self> {
            Self::attach_with_options(&SystemLookup, process, module, options)
        }
    }
}

#[cfg(windows)]
pub use system::SystemSession;
