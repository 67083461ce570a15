//! Typed values: the six searchable widths and how each decodes and compares

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a search, in boundary selector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Byte,
    Word,
    Dword,
    Qword,
    Float,
    Double,
}

impl ValueKind {
    pub const ALL: [ValueKind; 6] = [
        ValueKind::Byte,
        ValueKind::Word,
        ValueKind::Dword,
        ValueKind::Qword,
        ValueKind::Float,
        ValueKind::Double,
    ];

    /// Width of one element in bytes
    pub const fn width(&self) -> usize {
        match self {
            ValueKind::Byte => 1,
            ValueKind::Word => 2,
            ValueKind::Dword | ValueKind::Float => 4,
            ValueKind::Qword | ValueKind::Double => 8,
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, ValueKind::Float | ValueKind::Double)
    }

    /// Numeric selector used across the C boundary
    pub const fn id(&self) -> i32 {
        match self {
            ValueKind::Byte => 0,
            ValueKind::Word => 1,
            ValueKind::Dword => 2,
            ValueKind::Qword => 3,
            ValueKind::Float => 4,
            ValueKind::Double => 5,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        ValueKind::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            ValueKind::Byte => "byte",
            ValueKind::Word => "word",
            ValueKind::Dword => "dword",
            ValueKind::Qword => "qword",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ValueKind {
    type Err = MemoryError;

    fn from_str(s: &str) -> MemoryResult<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "byte" | "i8" => Ok(ValueKind::Byte),
            "word" | "i16" => Ok(ValueKind::Word),
            "dword" | "i32" => Ok(ValueKind::Dword),
            "qword" | "i64" => Ok(ValueKind::Qword),
            "float" | "f32" => Ok(ValueKind::Float),
            "double" | "f64" => Ok(ValueKind::Double),
            _ => Err(MemoryError::InvalidValueType(s.to_string())),
        }
    }
}

/// Absolute-difference bands used for floating point equality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub float: f32,
    pub double: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            float: 0.01,
            double: 0.001,
        }
    }
}

/// A fixed-width element the scanner and filter can decode and compare.
///
/// Implemented for `i8`, `i16`, `i32`, `i64`, `f32` and `f64`. Decoding is
/// native-endian because the bytes come from the same process.
pub trait Scalar: Copy + PartialOrd + Default + fmt::Debug + Send + Sync + 'static {
    const KIND: ValueKind;
    const WIDTH: usize;

    /// Decodes from exactly `WIDTH` bytes
    fn from_ne_slice(bytes: &[u8]) -> Self;

    /// Encodes into the first `WIDTH` bytes of `out`
    fn write_ne(self, out: &mut [u8]);

    /// XORs the raw representation with the width-truncated key
    fn unmask(self, key: u64) -> Self;

    /// Exact for integers, within the tolerance band for floats
    fn approx_eq(self, other: Self, tolerance: &Tolerance) -> bool;

    /// Exact for integers; floats differ only when at least the band apart,
    /// so a NaN neither equals nor differs from anything
    fn differs(self, other: Self, tolerance: &Tolerance) -> bool;

    fn into_value(self) -> MemoryValue;

    fn from_value(value: &MemoryValue) -> Option<Self>;
}

macro_rules! impl_integer_scalar {
    ($ty:ty, $kind:ident) => {
        impl Scalar for $ty {
            const KIND: ValueKind = ValueKind::$kind;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn from_ne_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$ty>::from_ne_bytes(raw)
            }

            fn write_ne(self, out: &mut [u8]) {
                out[..Self::WIDTH].copy_from_slice(&self.to_ne_bytes());
            }

            fn unmask(self, key: u64) -> Self {
                self ^ (key as $ty)
            }

            fn approx_eq(self, other: Self, _tolerance: &Tolerance) -> bool {
                self == other
            }

            fn differs(self, other: Self, _tolerance: &Tolerance) -> bool {
                self != other
            }

            fn into_value(self) -> MemoryValue {
                MemoryValue::$kind(self)
            }

            fn from_value(value: &MemoryValue) -> Option<Self> {
                match value {
                    MemoryValue::$kind(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_float_scalar {
    ($ty:ty, $bits:ty, $kind:ident, $band:ident) => {
        impl Scalar for $ty {
            const KIND: ValueKind = ValueKind::$kind;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn from_ne_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$ty>::from_ne_bytes(raw)
            }

            fn write_ne(self, out: &mut [u8]) {
                out[..Self::WIDTH].copy_from_slice(&self.to_ne_bytes());
            }

            fn unmask(self, key: u64) -> Self {
                <$ty>::from_bits(self.to_bits() ^ (key as $bits))
            }

            fn approx_eq(self, other: Self, tolerance: &Tolerance) -> bool {
                (self - other).abs() < tolerance.$band
            }

            fn differs(self, other: Self, tolerance: &Tolerance) -> bool {
                (self - other).abs() >= tolerance.$band
            }

            fn into_value(self) -> MemoryValue {
                MemoryValue::$kind(self)
            }

            fn from_value(value: &MemoryValue) -> Option<Self> {
                match value {
                    MemoryValue::$kind(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

impl_integer_scalar!(i8, Byte);
impl_integer_scalar!(i16, Word);
impl_integer_scalar!(i32, Dword);
impl_integer_scalar!(i64, Qword);
impl_float_scalar!(f32, u32, Float, float);
impl_float_scalar!(f64, u64, Double, double);

/// A value of one of the six supported kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MemoryValue {
    Byte(i8),
    Word(i16),
    Dword(i32),
    Qword(i64),
    Float(f32),
    Double(f64),
}

impl MemoryValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            MemoryValue::Byte(_) => ValueKind::Byte,
            MemoryValue::Word(_) => ValueKind::Word,
            MemoryValue::Dword(_) => ValueKind::Dword,
            MemoryValue::Qword(_) => ValueKind::Qword,
            MemoryValue::Float(_) => ValueKind::Float,
            MemoryValue::Double(_) => ValueKind::Double,
        }
    }

    /// Returns the size in bytes of the value
    pub fn size(&self) -> usize {
        self.kind().width()
    }

    /// Native-endian bytes of the value
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MemoryValue::Byte(v) => v.to_ne_bytes().to_vec(),
            MemoryValue::Word(v) => v.to_ne_bytes().to_vec(),
            MemoryValue::Dword(v) => v.to_ne_bytes().to_vec(),
            MemoryValue::Qword(v) => v.to_ne_bytes().to_vec(),
            MemoryValue::Float(v) => v.to_ne_bytes().to_vec(),
            MemoryValue::Double(v) => v.to_ne_bytes().to_vec(),
        }
    }

    /// Decodes a value of `kind` from the front of `bytes`
    pub fn from_bytes(bytes: &[u8], kind: ValueKind) -> Option<Self> {
        if bytes.len() < kind.width() {
            return None;
        }
        Some(match kind {
            ValueKind::Byte => i8::from_ne_slice(bytes).into_value(),
            ValueKind::Word => i16::from_ne_slice(bytes).into_value(),
            ValueKind::Dword => i32::from_ne_slice(bytes).into_value(),
            ValueKind::Qword => i64::from_ne_slice(bytes).into_value(),
            ValueKind::Float => f32::from_ne_slice(bytes).into_value(),
            ValueKind::Double => f64::from_ne_slice(bytes).into_value(),
        })
    }

    /// Parses user text as a value of `kind`
    pub fn parse(kind: ValueKind, text: &str) -> MemoryResult<Self> {
        let trimmed = text.trim();
        let invalid = || MemoryError::invalid_value(kind, text);
        Ok(match kind {
            ValueKind::Byte => MemoryValue::Byte(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Word => MemoryValue::Word(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Dword => MemoryValue::Dword(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Qword => MemoryValue::Qword(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Float => MemoryValue::Float(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Double => MemoryValue::Double(trimmed.parse().map_err(|_| invalid())?),
        })
    }

    /// Zero of the given kind, the accessor surface's failure value
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Byte => MemoryValue::Byte(0),
            ValueKind::Word => MemoryValue::Word(0),
            ValueKind::Dword => MemoryValue::Dword(0),
            ValueKind::Qword => MemoryValue::Qword(0),
            ValueKind::Float => MemoryValue::Float(0.0),
            ValueKind::Double => MemoryValue::Double(0.0),
        }
    }
}

impl fmt::Display for MemoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryValue::Byte(v) => write!(f, "{}", v),
            MemoryValue::Word(v) => write!(f, "{}", v),
            MemoryValue::Dword(v) => write!(f, "{}", v),
            MemoryValue::Qword(v) => write!(f, "{}", v),
            MemoryValue::Float(v) => write!(f, "{}", v),
            MemoryValue::Double(v) => write!(f, "{}", v),
        }
    }
}
