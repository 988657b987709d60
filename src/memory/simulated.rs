//! In-memory stand-in for a target process
//!
//! [`SimulatedProcess`] implements [`ProcessMemory`] over a set of mapped
//! regions so the accessor, resolver and session can be exercised without a
//! live process. It mirrors the OS primitive closely enough to matter:
//! unmapped addresses fail, transfers continue across adjacent regions and
//! come up short at the first gap or inaccessible region, and a terminated
//! target is gone.

use super::ProcessMemory;
use crate::core::types::{
    Address, MemoryError, MemoryResult, PointerWidth, ProcessId, TransferDirection,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Page permissions of a simulated region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    ReadWrite,
    ReadOnly,
    NoAccess,
}

impl Protection {
    fn allows(self, direction: TransferDirection) -> bool {
        match (self, direction) {
            (Protection::ReadWrite, _) => true,
            (Protection::ReadOnly, TransferDirection::Read) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Region {
    data: Vec<u8>,
    protection: Protection,
}

/// A fake target process with mapped memory regions
#[derive(Debug)]
pub struct SimulatedProcess {
    pid: ProcessId,
    regions: Mutex<BTreeMap<usize, Region>>,
    transfer_cap: Mutex<Option<usize>>,
    alive: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl SimulatedProcess {
    /// Create an empty process with the given PID
    pub fn new(pid: ProcessId) -> Self {
        SimulatedProcess {
            pid,
            regions: Mutex::new(BTreeMap::new()),
            transfer_cap: Mutex::new(None),
            alive: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// The simulated PID
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Map a zero-filled read/write region
    pub fn map_region(&self, base: Address, size: usize) -> &Self {
        self.map_with(base, size, Protection::ReadWrite)
    }

    /// Map a zero-filled region with the given protection.
    ///
    /// A region at an existing base replaces it.
    ///
    /// # Panics
    /// Panics when the new region overlaps a region at another base.
    pub fn map_with(&self, base: Address, size: usize, protection: Protection) -> &Self {
        let mut regions = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        let start = base.as_usize();
        let end = start.saturating_add(size);
        regions.remove(&start);

        if let Some((prev, region)) = regions.range(..start).next_back() {
            assert!(
                prev.saturating_add(region.data.len()) <= start,
                "region at {base} overlaps region at {}",
                Address::new(*prev)
            );
        }
        if let Some((next, _)) = regions.range(start..).next() {
            assert!(
                *next >= end,
                "region at {base} overlaps region at {}",
                Address::new(*next)
            );
        }

        regions.insert(
            base.as_usize(),
            Region {
                data: vec![0; size],
                protection,
            },
        );
        self
    }

    /// Remove the region starting at `base`
    pub fn unmap(&self, base: Address) -> &Self {
        let mut regions = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        regions.remove(&base.as_usize());
        self
    }

    /// Store bytes directly, ignoring protection and counters.
    ///
    /// # Panics
    /// Panics when the bytes do not fit inside one mapped region.
    pub fn poke(&self, address: Address, bytes: &[u8]) -> &Self {
        let mut regions = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        let (base, region) = regions
            .range_mut(..=address.as_usize())
            .next_back()
            .unwrap_or_else(|| panic!("poke at unmapped address {address}"));
        let start = address.as_usize() - *base;
        let end = start + bytes.len();
        assert!(end <= region.data.len(), "poke past end of region at {address}");
        region.data[start..end].copy_from_slice(bytes);
        self
    }

    /// Store a pointer of the given width, ignoring protection and counters
    pub fn poke_pointer(&self, address: Address, width: PointerWidth, value: Address) -> &Self {
        let bytes = width
            .encode(value)
            .unwrap_or_else(|e| panic!("cannot store pointer: {e}"));
        self.poke(address, &bytes)
    }

    /// Load bytes directly, ignoring protection and counters.
    ///
    /// # Panics
    /// Panics when the range is not inside one mapped region.
    pub fn peek(&self, address: Address, len: usize) -> Vec<u8> {
        let regions = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        let (base, region) = regions
            .range(..=address.as_usize())
            .next_back()
            .unwrap_or_else(|| panic!("peek at unmapped address {address}"));
        let start = address.as_usize() - *base;
        region.data[start..start + len].to_vec()
    }

    /// Cap every transfer at `max` bytes, or lift the cap with `None`
    pub fn limit_transfers(&self, max: Option<usize>) {
        *self
            .transfer_cap
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = max;
    }

    /// Simulate the target exiting
    pub fn terminate(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Whether [`terminate`](Self::terminate) has been called
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Number of read transfers attempted
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write transfers attempted
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Reset both transfer counters
    pub fn reset_counts(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Copies up to `requested` bytes starting at `address`, walking into
    /// each region that begins exactly where the previous one ends.
    ///
    /// `copy` receives the region, the offset into it, the offset into the
    /// caller's buffer and the byte count. Only a failure at the very first
    /// byte is an error; later gaps or denials end the transfer short.
    fn transfer(
        &self,
        address: Address,
        requested: usize,
        direction: TransferDirection,
        mut copy: impl FnMut(&mut Region, usize, usize, usize),
    ) -> MemoryResult<usize> {
        if !self.is_alive() {
            return Err(MemoryError::TargetGone(self.pid));
        }

        let cap = *self
            .transfer_cap
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let total = requested.min(cap.unwrap_or(usize::MAX));

        let mut regions = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut cursor = address.as_usize();
        let mut done = 0;

        while done < total {
            let found = regions
                .range_mut(..=cursor)
                .next_back()
                .filter(|(base, region)| cursor - **base < region.data.len());
            let Some((base, region)) = found else {
                if done == 0 {
                    return Err(MemoryError::InvalidAddress(address));
                }
                break;
            };

            if !region.protection.allows(direction) {
                if done == 0 {
                    let reason = match direction {
                        TransferDirection::Read => "region is not readable",
                        TransferDirection::Write => "region is not writable",
                    };
                    return Err(MemoryError::access_denied_at(self.pid, address, reason));
                }
                break;
            }

            let len = region.data.len();
            let start = cursor - *base;
            let count = (len - start).min(total - done);
            copy(region, start, done, count);
            done += count;

            match base.checked_add(len) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        Ok(done)
    }
}

impl ProcessMemory for SimulatedProcess {
    fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.transfer(
            address,
            buffer.len(),
            TransferDirection::Read,
            |region, start, at, count| {
                buffer[at..at + count].copy_from_slice(&region.data[start..start + count]);
            },
        )
    }

    fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.transfer(
            address,
            data.len(),
            TransferDirection::Write,
            |region, start, at, count| {
                region.data[start..start + count].copy_from_slice(&data[at..at + count]);
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inside_region() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x1000), 8)
            .poke(Address::new(0x1002), &[0xAA, 0xBB]);

        let mut buffer = [0u8; 4];
        let n = process.read_memory(Address::new(0x1000), &mut buffer).unwrap();
        assert_eq!(n, 4);
        assert_eq!(buffer, [0, 0, 0xAA, 0xBB]);
        assert_eq!(process.read_count(), 1);
    }

    #[test]
    fn test_short_read_at_region_end() {
        let process = SimulatedProcess::new(1);
        process.map_region(Address::new(0x1000), 8);

        let mut buffer = [0u8; 4];
        let n = process.read_memory(Address::new(0x1006), &mut buffer).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_gap_between_regions_is_unmapped() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x1000), 0x10)
            .map_region(Address::new(0x2000), 0x10);

        let mut buffer = [0u8; 1];
        assert!(matches!(
            process.read_memory(Address::new(0x1010), &mut buffer),
            Err(MemoryError::InvalidAddress(_))
        ));
        assert!(matches!(
            process.read_memory(Address::new(0x0FFF), &mut buffer),
            Err(MemoryError::InvalidAddress(_))
        ));

        process.unmap(Address::new(0x2000));
        assert!(process.read_memory(Address::new(0x2000), &mut buffer).is_err());
    }

    #[test]
    fn test_transfer_continues_into_adjacent_region() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x1000), 0x10)
            .map_region(Address::new(0x1010), 0x10);

        let data = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(process.write_memory(Address::new(0x100C), &data).unwrap(), 8);

        let mut buffer = [0u8; 8];
        assert_eq!(process.read_memory(Address::new(0x100C), &mut buffer).unwrap(), 8);
        assert_eq!(buffer, data);
        assert_eq!(process.peek(Address::new(0x1010), 4), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_transfer_stops_at_inaccessible_neighbour() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x1000), 0x10)
            .map_with(Address::new(0x1010), 0x10, Protection::ReadOnly);

        // Readable across the boundary, writable only up to it
        let mut buffer = [0u8; 8];
        assert_eq!(process.read_memory(Address::new(0x100C), &mut buffer).unwrap(), 8);
        assert_eq!(process.write_memory(Address::new(0x100C), &[9; 8]).unwrap(), 4);
    }

    #[test]
    fn test_remap_same_base_replaces_region() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x1000), 0x10)
            .poke(Address::new(0x1000), &[7])
            .map_region(Address::new(0x1000), 0x20);
        assert_eq!(process.peek(Address::new(0x1000), 1), vec![0]);
        assert_eq!(process.peek(Address::new(0x101F), 1), vec![0]);
    }

    #[test]
    #[should_panic(expected = "overlaps")]
    fn test_overlapping_regions_are_rejected() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x1000), 0x10)
            .map_region(Address::new(0x1008), 0x10);
    }

    #[test]
    fn test_protection() {
        let process = SimulatedProcess::new(1);
        process
            .map_with(Address::new(0x1000), 4, Protection::ReadOnly)
            .map_with(Address::new(0x2000), 4, Protection::NoAccess);

        let mut buffer = [0u8; 4];
        assert!(process.read_memory(Address::new(0x1000), &mut buffer).is_ok());
        assert!(matches!(
            process.write_memory(Address::new(0x1000), &[1]),
            Err(MemoryError::AccessDenied { .. })
        ));
        assert!(matches!(
            process.read_memory(Address::new(0x2000), &mut buffer),
            Err(MemoryError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_transfer_cap_and_termination() {
        let process = SimulatedProcess::new(9);
        process.map_region(Address::new(0x1000), 16);
        process.limit_transfers(Some(3));

        assert_eq!(process.write_memory(Address::new(0x1000), &[1; 8]).unwrap(), 3);
        assert_eq!(process.peek(Address::new(0x1000), 4), vec![1, 1, 1, 0]);

        process.limit_transfers(None);
        process.terminate();
        let mut buffer = [0u8; 1];
        assert!(matches!(
            process.read_memory(Address::new(0x1000), &mut buffer),
            Err(MemoryError::TargetGone(9))
        ));
        assert_eq!(process.read_count(), 1);
        assert_eq!(process.write_count(), 1);

        process.reset_counts();
        assert_eq!(process.read_count(), 0);
    }
}
