//! Pointer-chain resolution
//!
//! A chain `[o0, o1, ..., on]` applied to a base `b` computes
//! `[[b + o0] + o1] ... + on`: every offset but the last is added and then
//! dereferenced, the last one is only added. Resolution stops at the first
//! hop that cannot be read and reports [`MemoryError::Unresolved`], so a
//! failed walk is never confused with a chain that legitimately ends at 0.

use super::{MemoryAccessor, ProcessMemory};
use crate::core::types::{parse_usize, Address, MemoryError, MemoryResult, Offset, PointerWidth};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// A non-empty, ordered sequence of offsets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffsetChain(Vec<Offset>);

impl OffsetChain {
    /// Build a chain, rejecting an empty offset list
    pub fn new(offsets: impl Into<Vec<Offset>>) -> MemoryResult<Self> {
        let offsets = offsets.into();
        if offsets.is_empty() {
            return Err(MemoryError::EmptyChain);
        }
        Ok(OffsetChain(offsets))
    }

    /// All offsets in order
    pub fn offsets(&self) -> &[Offset] {
        &self.0
    }

    /// Number of offsets; always at least one
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The offsets that are dereferenced, and the final added offset
    pub fn split_last(&self) -> (&[Offset], Offset) {
        match self.0.split_last() {
            Some((last, hops)) => (hops, *last),
            None => unreachable!("offset chains are never empty"),
        }
    }
}

impl TryFrom<Vec<Offset>> for OffsetChain {
    type Error = MemoryError;

    fn try_from(offsets: Vec<Offset>) -> MemoryResult<Self> {
        OffsetChain::new(offsets)
    }
}

impl TryFrom<&[Offset]> for OffsetChain {
    type Error = MemoryError;

    fn try_from(offsets: &[Offset]) -> MemoryResult<Self> {
        OffsetChain::new(offsets.to_vec())
    }
}

/// Parses `"0x10, 0x20, 0x4"`, `"0x10 -> 0x20 -> 0x4"` or whitespace
/// separated offsets.
impl FromStr for OffsetChain {
    type Err = MemoryError;

    fn from_str(s: &str) -> MemoryResult<Self> {
        let offsets = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .flat_map(|part| part.split("->"))
            .filter(|part| !part.is_empty())
            .map(|part| {
                parse_usize(part)
                    .ok_or_else(|| MemoryError::InvalidValue(format!("not an offset: {part}")))
            })
            .collect::<MemoryResult<Vec<_>>>()?;
        OffsetChain::new(offsets)
    }
}

impl fmt::Display for OffsetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, offset) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "0x{offset:X}")?;
        }
        Ok(())
    }
}

/// One dereference performed while walking a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainHop {
    pub level: usize,
    /// Address the pointer was read from
    pub address: Address,
    /// Pointer value found there
    pub value: Address,
}

/// A resolved chain together with every hop taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedChain {
    pub base: Address,
    pub hops: Vec<ChainHop>,
    pub target: Address,
}

/// Walks offset chains through a [`MemoryAccessor`]
pub struct ChainResolver<'a, M: ?Sized> {
    accessor: MemoryAccessor<'a, M>,
    width: PointerWidth,
}

impl<'a, M: ProcessMemory + ?Sized> ChainResolver<'a, M> {
    /// Create a resolver reading pointers of the given width
    pub fn new(accessor: MemoryAccessor<'a, M>, width: PointerWidth) -> Self {
        ChainResolver { accessor, width }
    }

    /// Pointer width used for intermediate reads
    pub fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    /// Resolve `chain` starting at `base`
    pub fn resolve(&self, base: Address, chain: &OffsetChain) -> MemoryResult<Address> {
        self.walk(base, chain, |_| {})
    }

    /// Resolve a raw offset slice; an empty slice is rejected
    pub fn resolve_offsets(&self, base: Address, offsets: &[Offset]) -> MemoryResult<Address> {
        self.resolve(base, &OffsetChain::try_from(offsets)?)
    }

    /// Resolve `chain` and report every hop taken
    pub fn resolve_traced(&self, base: Address, chain: &OffsetChain) -> MemoryResult<ResolvedChain> {
        let mut hops = Vec::with_capacity(chain.len() - 1);
        let target = self.walk(base, chain, |hop| hops.push(hop))?;
        Ok(ResolvedChain { base, hops, target })
    }

    fn walk(
        &self,
        base: Address,
        chain: &OffsetChain,
        mut on_hop: impl FnMut(ChainHop),
    ) -> MemoryResult<Address> {
        let (hops, last) = chain.split_last();
        let mut current = base;

        for (level, &offset) in hops.iter().enumerate() {
            let address = self.width.truncate(current.add(offset));
            let value = self
                .accessor
                .read_pointer(address, self.width)
                .map_err(|source| {
                    debug!(%base, level, %address, error = %source, "pointer chain broken");
                    MemoryError::unresolved(level, address, source)
                })?;
            trace!(level, %address, %value, "pointer hop");
            on_hop(ChainHop {
                level,
                address,
                value,
            });
            current = value;
        }

        Ok(self.width.truncate(current.add(last)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimulatedProcess;

    #[test]
    fn test_chain_requires_offsets() {
        assert!(matches!(OffsetChain::new(vec![]), Err(MemoryError::EmptyChain)));
        assert_eq!(OffsetChain::new(vec![1, 2]).unwrap().len(), 2);
    }

    #[test]
    fn test_split_last() {
        let chain = OffsetChain::new(vec![0x10, 0x20, 0x4]).unwrap();
        assert_eq!(chain.split_last(), (&[0x10, 0x20][..], 0x4));

        let single = OffsetChain::new(vec![0x8]).unwrap();
        assert_eq!(single.split_last(), (&[][..], 0x8));
    }

    #[test]
    fn test_parse_chain() {
        let expected = OffsetChain::new(vec![0x10, 0x20, 0x4]).unwrap();
        assert_eq!("0x10, 0x20, 0x4".parse::<OffsetChain>().unwrap(), expected);
        assert_eq!("0x10 -> 0x20 -> 0x4".parse::<OffsetChain>().unwrap(), expected);
        assert_eq!("0x10->0x20->0x4".parse::<OffsetChain>().unwrap(), expected);
        assert_eq!("16 32 4".parse::<OffsetChain>().unwrap(), expected);
        assert!(matches!("".parse::<OffsetChain>(), Err(MemoryError::EmptyChain)));
        assert!("0x10, zz!".parse::<OffsetChain>().is_err());
    }

    #[test]
    fn test_display_chain() {
        let chain = OffsetChain::new(vec![0x10, 0x20, 0x4]).unwrap();
        assert_eq!(chain.to_string(), "0x10 -> 0x20 -> 0x4");
    }

    #[test]
    fn test_resolve_traced_reports_hops() {
        let process = SimulatedProcess::new(1);
        process
            .map_region(Address::new(0x400000), 0x100)
            .map_region(Address::new(0x500000), 0x100)
            .poke_pointer(Address::new(0x400010), PointerWidth::Bits32, Address::new(0x500000))
            .poke_pointer(Address::new(0x500020), PointerWidth::Bits32, Address::new(0x600000));

        let resolver = ChainResolver::new(MemoryAccessor::new(&process), PointerWidth::Bits32);
        let chain = OffsetChain::new(vec![0x10, 0x20, 0x4]).unwrap();
        let resolved = resolver.resolve_traced(Address::new(0x400000), &chain).unwrap();

        assert_eq!(resolved.target, Address::new(0x600004));
        assert_eq!(
            resolved.hops,
            vec![
                ChainHop {
                    level: 0,
                    address: Address::new(0x400010),
                    value: Address::new(0x500000),
                },
                ChainHop {
                    level: 1,
                    address: Address::new(0x500020),
                    value: Address::new(0x600000),
                },
            ]
        );
    }

    #[test]
    fn test_resolve_offsets_rejects_empty() {
        let process = SimulatedProcess::new(1);
        let resolver = ChainResolver::new(MemoryAccessor::new(&process), PointerWidth::Bits64);
        assert!(matches!(
            resolver.resolve_offsets(Address::new(0x1000), &[]),
            Err(MemoryError::EmptyChain)
        ));
        assert_eq!(process.read_count(), 0);
    }

    #[test]
    fn test_32_bit_arithmetic_wraps() {
        let process = SimulatedProcess::new(1);
        let resolver = ChainResolver::new(MemoryAccessor::new(&process), PointerWidth::Bits32);
        let target = resolver
            .resolve_offsets(Address::new(0xFFFF_FFF0), &[0x20])
            .unwrap();
        assert_eq!(target, Address::new(0x10));
    }
}
