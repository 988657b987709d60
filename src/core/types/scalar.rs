//! Fixed-size scalar kinds that can be moved across the process boundary

use super::{MemoryError, MemoryResult, PointerWidth};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod sealed {
    pub trait Sealed {}
}

/// A fixed-size scalar with an explicit native-endian byte encoding.
///
/// Implemented only for the fixed-width primitive integers and floats; values
/// are decoded from exactly `size_of::<Self>()` bytes, never reinterpreted in
/// place. `usize` is not a `Scalar`: [`ScalarKind::USize`] is read and written
/// at the target's [`PointerWidth`].
pub trait Scalar: Copy + fmt::Debug + sealed::Sealed {
    /// Byte representation of exactly `size_of::<Self>()` bytes
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    /// The runtime tag for this type
    const KIND: ScalarKind;

    /// Decodes the value from its native-endian bytes
    fn from_bytes(bytes: Self::Bytes) -> Self;

    /// Encodes the value into its native-endian bytes
    fn to_bytes(self) -> Self::Bytes;
}

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];
                const KIND: ScalarKind = ScalarKind::$kind;

                #[inline]
                fn from_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_ne_bytes(bytes)
                }

                #[inline]
                fn to_bytes(self) -> Self::Bytes {
                    self.to_ne_bytes()
                }
            }
        )*
    };
}

impl_scalar! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// Runtime tag naming one of the [`Scalar`] types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    U8,
    U16,
    U32,
    U64,
    /// Address-width unsigned integer, sized by the target's pointer width
    USize,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    /// Size in bytes of this kind inside a target with the given pointer width
    pub const fn size(&self, width: PointerWidth) -> usize {
        match self {
            ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
            ScalarKind::USize => width.size(),
        }
    }

    /// Parses a textual value of this kind
    pub fn parse_value(&self, text: &str) -> MemoryResult<ScalarValue> {
        let text = text.trim();
        let invalid = || MemoryError::InvalidValue(format!("{text:?} is not a valid {self}"));

        let value = match self {
            ScalarKind::U8 => ScalarValue::U8(parse_unsigned(text).ok_or_else(invalid)?),
            ScalarKind::U16 => ScalarValue::U16(parse_unsigned(text).ok_or_else(invalid)?),
            ScalarKind::U32 => ScalarValue::U32(parse_unsigned(text).ok_or_else(invalid)?),
            ScalarKind::U64 => ScalarValue::U64(parse_unsigned(text).ok_or_else(invalid)?),
            ScalarKind::USize => ScalarValue::USize(parse_unsigned(text).ok_or_else(invalid)?),
            ScalarKind::I8 => ScalarValue::I8(text.parse().map_err(|_| invalid())?),
            ScalarKind::I16 => ScalarValue::I16(text.parse().map_err(|_| invalid())?),
            ScalarKind::I32 => ScalarValue::I32(text.parse().map_err(|_| invalid())?),
            ScalarKind::I64 => ScalarValue::I64(text.parse().map_err(|_| invalid())?),
            ScalarKind::F32 => ScalarValue::F32(text.parse().map_err(|_| invalid())?),
            ScalarKind::F64 => ScalarValue::F64(text.parse().map_err(|_| invalid())?),
        };
        Ok(value)
    }
}

fn parse_unsigned<T: TryFrom<u64>>(text: &str) -> Option<T> {
    let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => text.parse::<u64>().ok()?,
    };
    T::try_from(value).ok()
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::USize => "usize",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        };
        f.write_str(name)
    }
}

impl FromStr for ScalarKind {
    type Err = MemoryError;

    fn from_str(s: &str) -> MemoryResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u8" | "byte" => Ok(ScalarKind::U8),
            "u16" => Ok(ScalarKind::U16),
            "u32" => Ok(ScalarKind::U32),
            "u64" => Ok(ScalarKind::U64),
            "usize" | "ptr" => Ok(ScalarKind::USize),
            "i8" => Ok(ScalarKind::I8),
            "i16" => Ok(ScalarKind::I16),
            "i32" => Ok(ScalarKind::I32),
            "i64" => Ok(ScalarKind::I64),
            "f32" => Ok(ScalarKind::F32),
            "f64" => Ok(ScalarKind::F64),
            other => Err(MemoryError::InvalidValue(format!(
                "unknown scalar kind: {other}"
            ))),
        }
    }
}

/// A scalar value tagged with its kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ScalarValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    USize(usize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    /// Gets the kind of this value
    pub const fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::U8(_) => ScalarKind::U8,
            ScalarValue::U16(_) => ScalarKind::U16,
            ScalarValue::U32(_) => ScalarKind::U32,
            ScalarValue::U64(_) => ScalarKind::U64,
            ScalarValue::USize(_) => ScalarKind::USize,
            ScalarValue::I8(_) => ScalarKind::I8,
            ScalarValue::I16(_) => ScalarKind::I16,
            ScalarValue::I32(_) => ScalarKind::I32,
            ScalarValue::I64(_) => ScalarKind::I64,
            ScalarValue::F32(_) => ScalarKind::F32,
            ScalarValue::F64(_) => ScalarKind::F64,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::U8(v) => write!(f, "{}", v),
            ScalarValue::U16(v) => write!(f, "{}", v),
            ScalarValue::U32(v) => write!(f, "{}", v),
            ScalarValue::U64(v) => write!(f, "{}", v),
            ScalarValue::USize(v) => write!(f, "{}", v),
            ScalarValue::I8(v) => write!(f, "{}", v),
            ScalarValue::I16(v) => write!(f, "{}", v),
            ScalarValue::I32(v) => write!(f, "{}", v),
            ScalarValue::I64(v) => write!(f, "{}", v),
            ScalarValue::F32(v) => write!(f, "{}", v),
            ScalarValue::F64(v) => write!(f, "{}", v),
        }
    }
}
