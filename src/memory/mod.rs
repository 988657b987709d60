//! Memory operations on an attached process
//!
//! This module layers typed access over the raw transfer primitive:
//! - [`ProcessMemory`]: the raw sized read/write primitive of a target
//! - [`MemoryAccessor`]: full-transfer-or-error raw and scalar access
//! - [`ChainResolver`]: pointer-chain walking on top of the accessor
//! - [`simulated`]: an in-memory target used by tests and harnesses

pub mod accessor;
pub mod chain;
pub mod simulated;

pub use accessor::MemoryAccessor;
pub use chain::{ChainHop, ChainResolver, OffsetChain, ResolvedChain};
pub use simulated::{Protection, SimulatedProcess};

use crate::core::types::{Address, MemoryResult};
use std::sync::Arc;

/// Raw cross-process transfer primitive.
///
/// Implementations copy at most `buffer.len()` bytes and report how many
/// bytes actually moved. A short count is not an error at this level; the
/// [`MemoryAccessor`] turns it into [`PartialTransfer`].
///
/// [`PartialTransfer`]: crate::MemoryError::PartialTransfer
pub trait ProcessMemory {
    /// Read from `address` in the target into `buffer`
    fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize>;

    /// Write `data` into the target at `address`
    fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<usize>;
}

impl<M: ProcessMemory + ?Sized> ProcessMemory for &M {
    fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        (**self).read_memory(address, buffer)
    }

    fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        (**self).write_memory(address, data)
    }
}

impl<M: ProcessMemory + ?Sized> ProcessMemory for Arc<M> {
    fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<usize> {
        (**self).read_memory(address, buffer)
    }

    fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<usize> {
        (**self).write_memory(address, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_and_ref_forward_to_target() {
        let process = Arc::new(SimulatedProcess::new(1));
        process.map_region(Address::new(0x1000), 16);
        process.poke(Address::new(0x1000), &[1, 2, 3, 4]);

        let mut buffer = [0u8; 4];
        let by_ref: &SimulatedProcess = &process;
        assert_eq!(by_ref.read_memory(Address::new(0x1000), &mut buffer).unwrap(), 4);
        assert_eq!(buffer, [1, 2, 3, 4]);

        assert_eq!(process.write_memory(Address::new(0x1000), &[9]).unwrap(), 1);
        assert_eq!(process.peek(Address::new(0x1000), 1), vec![9]);
    }
}
