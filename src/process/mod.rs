//! Process and module lookup
//!
//! [`ProcessLookup`] is the seam between a session and the operating
//! system. [`SimulatedSystem`] serves tests on every platform; on Windows
//! [`SystemLookup`] walks ToolHelp32 snapshots and opens real handles.

pub mod lookup;
pub mod simulated;

#[cfg(windows)]
pub mod enumerator;
#[cfg(windows)]
pub mod handle;
#[cfg(windows)]
pub mod modules;
#[cfg(windows)]
pub mod system;

pub use lookup::ProcessLookup;
pub use simulated::{LookupCall, OpenDenial, SimulatedSystem};

#[cfg(windows)]
pub use enumerator::{enumerate_processes, find_process_by_name, ProcessEnumerator};
#[cfg(windows)]
pub use handle::{ProcessAccess, ProcessHandle};
#[cfg(windows)]
pub use modules::{enumerate_modules, find_module_by_name, ModuleEnumerator};
#[cfg(windows)]
pub use system::SystemLookup;
