//! Pointer width of the target process

use super::{Address, MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;
use std::str::FromStr;

/// Size of a pointer inside the target process.
///
/// A 32-bit target read from a 64-bit host stores 4-byte pointers, so the
/// chain resolver cannot assume the host's `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerWidth {
    #[serde(rename = "32")]
    Bits32,
    #[serde(rename = "64")]
    Bits64,
}

impl PointerWidth {
    /// Pointer width of the host process
    pub const fn native() -> Self {
        if mem::size_of::<usize>() == 4 {
            PointerWidth::Bits32
        } else {
            PointerWidth::Bits64
        }
    }

    /// Size of a pointer in bytes
    pub const fn size(&self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }

    /// Truncates an address to what this width can represent
    pub const fn truncate(&self, address: Address) -> Address {
        match self {
            PointerWidth::Bits32 => Address::new(address.as_usize() & 0xFFFF_FFFF),
            PointerWidth::Bits64 => address,
        }
    }

    /// Decodes a pointer from exactly [`size`](Self::size) native-endian bytes
    pub fn decode(&self, bytes: &[u8]) -> MemoryResult<Address> {
        if bytes.len() != self.size() {
            return Err(MemoryError::InvalidValue(format!(
                "pointer of width {} needs {} bytes, got {}",
                self,
                self.size(),
                bytes.len()
            )));
        }

        let value = match self {
            PointerWidth::Bits32 => {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(bytes);
                u32::from_ne_bytes(raw) as usize
            }
            PointerWidth::Bits64 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                u64::from_ne_bytes(raw) as usize
            }
        };
        Ok(Address::new(value))
    }

    /// Encodes a pointer into native-endian bytes of this width.
    ///
    /// Fails when the address does not fit a 32-bit pointer.
    pub fn encode(&self, address: Address) -> MemoryResult<Vec<u8>> {
        match self {
            PointerWidth::Bits32 => u32::try_from(address.as_usize())
                .map(|v| v.to_ne_bytes().to_vec())
                .map_err(|_| {
                    MemoryError::InvalidValue(format!("{address} does not fit a 32-bit pointer"))
                }),
            PointerWidth::Bits64 => Ok((address.as_usize() as u64).to_ne_bytes().to_vec()),
        }
    }
}

impl Default for PointerWidth {
    fn default() -> Self {
        Self::native()
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerWidth::Bits32 => write!(f, "32-bit"),
            PointerWidth::Bits64 => write!(f, "64-bit"),
        }
    }
}

impl FromStr for PointerWidth {
    type Err = MemoryError;

    fn from_str(s: &str) -> MemoryResult<Self> {
        match s.trim() {
            "32" | "x86" => Ok(PointerWidth::Bits32),
            "64" | "x64" => Ok(PointerWidth::Bits64),
            other => Err(MemoryError::InvalidValue(format!(
                "unknown pointer width: {other}"
            ))),
        }
    }
}
