//! In-memory process table implementing [`ProcessLookup`]

use super::ProcessLookup;
use crate::core::types::{
    Address, MemoryError, MemoryResult, ModuleInfo, PointerWidth, ProcessId, ProcessInfo,
};
use crate::memory::SimulatedProcess;
use std::sync::{Arc, Mutex, PoisonError};

/// How opening a simulated process should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDenial {
    AccessDenied,
    OpenFailed,
}

/// A lookup step observed by [`SimulatedSystem`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCall {
    FindProcess(String),
    OpenProcess(ProcessId),
    FindModule(ProcessId, String),
    PointerWidth(ProcessId),
}

#[derive(Debug)]
struct Entry {
    info: ProcessInfo,
    memory: Arc<SimulatedProcess>,
    modules: Vec<ModuleInfo>,
    width: PointerWidth,
    denial: Option<OpenDenial>,
}

/// A fake process table with loaded modules
#[derive(Debug, Default)]
pub struct SimulatedSystem {
    entries: Vec<Entry>,
    calls: Mutex<Vec<LookupCall>>,
}

impl SimulatedSystem {
    /// Create an empty process table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process and return its memory for setup
    pub fn add_process(&mut self, pid: ProcessId, name: impl Into<String>) -> Arc<SimulatedProcess> {
        let memory = Arc::new(SimulatedProcess::new(pid));
        self.entries.push(Entry {
            info: ProcessInfo::new(pid, name),
            memory: Arc::clone(&memory),
            modules: Vec::new(),
            width: PointerWidth::native(),
            denial: None,
        });
        memory
    }

    /// Register a module loaded at `base` in process `pid`
    pub fn add_module(
        &mut self,
        pid: ProcessId,
        name: impl Into<String>,
        base: Address,
        size: usize,
    ) -> &mut Self {
        if let Some(entry) = self.entry_mut(pid) {
            entry.modules.push(ModuleInfo::new(name, base, size));
        }
        self
    }

    /// Set the pointer width reported for process `pid`
    pub fn set_pointer_width(&mut self, pid: ProcessId, width: PointerWidth) -> &mut Self {
        if let Some(entry) = self.entry_mut(pid) {
            entry.width = width;
        }
        self
    }

    /// Make opening process `pid` fail
    pub fn deny_open(&mut self, pid: ProcessId, denial: OpenDenial) -> &mut Self {
        if let Some(entry) = self.entry_mut(pid) {
            entry.denial = Some(denial);
        }
        self
    }

    /// Lookup steps performed so far, in order
    pub fn calls(&self) -> Vec<LookupCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: LookupCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn entry(&self, pid: ProcessId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.info.pid == pid)
    }

    fn entry_mut(&mut self, pid: ProcessId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.info.pid == pid)
    }
}

impl ProcessLookup for SimulatedSystem {
    type Handle = Arc<SimulatedProcess>;

    fn find_process(&self, name: &str) -> MemoryResult<ProcessInfo> {
        self.record(LookupCall::FindProcess(name.to_string()));
        self.entries
            .iter()
            .find(|e| e.info.name_matches(name))
            .map(|e| e.info.clone())
            .ok_or_else(|| MemoryError::ProcessNotFound(name.to_string()))
    }

    fn open_process(&self, process: &ProcessInfo) -> MemoryResult<Self::Handle> {
        self.record(LookupCall::OpenProcess(process.pid));
        let entry = self
            .entry(process.pid)
            .ok_or_else(|| MemoryError::open_failed(process.pid, "no such process"))?;

        match entry.denial {
            Some(OpenDenial::AccessDenied) => Err(MemoryError::access_denied(
                process.pid,
                "simulated access denial",
            )),
            Some(OpenDenial::OpenFailed) => Err(MemoryError::open_failed(
                process.pid,
                "simulated open failure",
            )),
            None if !entry.memory.is_alive() => Err(MemoryError::open_failed(
                process.pid,
                "process has exited",
            )),
            None => Ok(Arc::clone(&entry.memory)),
        }
    }

    fn find_module(
        &self,
        process: &ProcessInfo,
        _handle: &Self::Handle,
        name: &str,
    ) -> MemoryResult<ModuleInfo> {
        self.record(LookupCall::FindModule(process.pid, name.to_string()));
        self.entry(process.pid)
            .and_then(|e| e.modules.iter().find(|m| m.name_matches(name)))
            .cloned()
            .ok_or_else(|| MemoryError::ModuleNotFound {
                module: name.to_string(),
                pid: process.pid,
            })
    }

    fn pointer_width(
        &self,
        process: &ProcessInfo,
        _handle: &Self::Handle,
    ) -> MemoryResult<PointerWidth> {
        self.record(LookupCall::PointerWidth(process.pid));
        Ok(self
            .entry(process.pid)
            .map(|e| e.width)
            .unwrap_or_else(PointerWidth::native))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_process_is_exact() {
        let mut system = SimulatedSystem::new();
        system.add_process(10, "game.exe");

        assert_eq!(system.find_process("game.exe").unwrap().pid, 10);
        assert!(matches!(
            system.find_process("GAME.EXE"),
            Err(MemoryError::ProcessNotFound(_))
        ));
    }

    #[test]
    fn test_open_denials() {
        let mut system = SimulatedSystem::new();
        system.add_process(10, "a.exe");
        system.add_process(11, "b.exe");
        system
            .deny_open(10, OpenDenial::AccessDenied)
            .deny_open(11, OpenDenial::OpenFailed);

        assert!(matches!(
            system.open_process(&ProcessInfo::new(10, "a.exe")),
            Err(MemoryError::AccessDenied { pid: 10, .. })
        ));
        assert!(matches!(
            system.open_process(&ProcessInfo::new(11, "b.exe")),
            Err(MemoryError::OpenFailed { pid: 11, .. })
        ));
    }

    #[test]
    fn test_calls_are_recorded() {
        let mut system = SimulatedSystem::new();
        let memory = system.add_process(10, "game.exe");
        system.add_module(10, "game.exe", Address::new(0x400000), 0x1000);

        let process = system.find_process("game.exe").unwrap();
        let module = system.find_module(&process, &memory, "game.exe").unwrap();
        assert_eq!(module.base_address, Address::new(0x400000));

        assert_eq!(
            system.calls(),
            vec![
                LookupCall::FindProcess("game.exe".to_string()),
                LookupCall::FindModule(10, "game.exe".to_string()),
            ]
        );
    }
}
