//! Typed memory access with full-transfer-or-error semantics

use super::ProcessMemory;
use crate::core::types::{
    Address, MemoryError, MemoryResult, PointerWidth, Scalar, ScalarKind, ScalarValue,
    TransferDirection,
};
use tracing::trace;

/// Moves fixed-size values between this process and the target.
///
/// Every transfer either moves exactly the requested number of bytes or
/// fails. No caching, no retries.
pub struct MemoryAccessor<'a, M: ?Sized> {
    memory: &'a M,
    limit: Option<usize>,
}

impl<M: ?Sized> Clone for MemoryAccessor<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ?Sized> Copy for MemoryAccessor<'_, M> {}

impl<'a, M: ProcessMemory + ?Sized> MemoryAccessor<'a, M> {
    /// Create a new accessor over a target
    pub fn new(memory: &'a M) -> Self {
        MemoryAccessor {
            memory,
            limit: None,
        }
    }

    /// Reject transfers larger than `limit` bytes before touching the target
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The configured transfer size limit
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The underlying target
    pub fn memory(&self) -> &'a M {
        self.memory
    }

    fn check_size(&self, requested: usize) -> MemoryResult<()> {
        match self.limit {
            Some(limit) if requested > limit => {
                Err(MemoryError::TransferTooLarge { requested, limit })
            }
            _ => Ok(()),
        }
    }

    /// Fill `buffer` from `address`, failing unless every byte was read
    pub fn read_exact(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.check_size(buffer.len())?;

        let transferred = self.memory.read_memory(address, buffer)?;
        if transferred != buffer.len() {
            trace!(%address, requested = buffer.len(), transferred, "short read");
            return Err(MemoryError::PartialTransfer {
                address,
                direction: TransferDirection::Read,
                requested: buffer.len(),
                transferred,
            });
        }
        Ok(())
    }

    /// Read exactly `size` bytes from `address`
    pub fn read_raw(&self, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        self.check_size(size)?;
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(size).map_err(|e| {
            MemoryError::InvalidValue(format!("cannot allocate {size} bytes to read: {e}"))
        })?;
        buffer.resize(size, 0);
        self.read_exact(address, &mut buffer)?;
        Ok(buffer)
    }

    /// Write all of `data` to `address`
    pub fn write_raw(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.check_size(data.len())?;

        let transferred = self.memory.write_memory(address, data)?;
        if transferred != data.len() {
            trace!(%address, requested = data.len(), transferred, "short write");
            return Err(MemoryError::PartialTransfer {
                address,
                direction: TransferDirection::Write,
                requested: data.len(),
                transferred,
            });
        }
        Ok(())
    }

    /// Read a scalar value from memory
    pub fn read<T: Scalar>(&self, address: Address) -> MemoryResult<T> {
        let mut bytes = T::Bytes::default();
        self.read_exact(address, bytes.as_mut())?;
        Ok(T::from_bytes(bytes))
    }

    /// Write a scalar value to memory
    pub fn write<T: Scalar>(&self, address: Address, value: T) -> MemoryResult<()> {
        self.write_raw(address, value.to_bytes().as_ref())
    }

    /// Read a pointer of the given width
    pub fn read_pointer(&self, address: Address, width: PointerWidth) -> MemoryResult<Address> {
        let mut bytes = [0u8; 8];
        let bytes = &mut bytes[..width.size()];
        self.read_exact(address, bytes)?;
        width.decode(bytes)
    }

    /// Write a pointer of the given width
    pub fn write_pointer(
        &self,
        address: Address,
        width: PointerWidth,
        value: Address,
    ) -> MemoryResult<()> {
        self.write_raw(address, &width.encode(value)?)
    }

    /// Read a scalar whose kind is chosen at runtime.
    ///
    /// [`ScalarKind::USize`] is read as a pointer of `width`.
    pub fn read_value(
        &self,
        address: Address,
        kind: ScalarKind,
        width: PointerWidth,
    ) -> MemoryResult<ScalarValue> {
        let value = match kind {
            ScalarKind::U8 => ScalarValue::U8(self.read(address)?),
            ScalarKind::U16 => ScalarValue::U16(self.read(address)?),
            ScalarKind::U32 => ScalarValue::U32(self.read(address)?),
            ScalarKind::U64 => ScalarValue::U64(self.read(address)?),
            ScalarKind::USize => {
                ScalarValue::USize(self.read_pointer(address, width)?.as_usize())
            }
            ScalarKind::I8 => ScalarValue::I8(self.read(address)?),
            ScalarKind::I16 => ScalarValue::I16(self.read(address)?),
            ScalarKind::I32 => ScalarValue::I32(self.read(address)?),
            ScalarKind::I64 => ScalarValue::I64(self.read(address)?),
            ScalarKind::F32 => ScalarValue::F32(self.read(address)?),
            ScalarKind::F64 => ScalarValue::F64(self.read(address)?),
        };
        Ok(value)
    }

    /// Write a runtime-tagged scalar; `USize` values are written at `width`
    pub fn write_value(
        &self,
        address: Address,
        value: ScalarValue,
        width: PointerWidth,
    ) -> MemoryResult<()> {
        match value {
            ScalarValue::U8(v) => self.write(address, v),
            ScalarValue::U16(v) => self.write(address, v),
            ScalarValue::U32(v) => self.write(address, v),
            ScalarValue::U64(v) => self.write(address, v),
            ScalarValue::USize(v) => self.write_pointer(address, width, Address::new(v)),
            ScalarValue::I8(v) => self.write(address, v),
            ScalarValue::I16(v) => self.write(address, v),
            ScalarValue::I32(v) => self.write(address, v),
            ScalarValue::I64(v) => self.write(address, v),
            ScalarValue::F32(v) => self.write(address, v),
            ScalarValue::F64(v) => self.write(address, v),
        }
    }
}
