//! Per-width read/write helpers that never fail loudly
//!
//! Reads return zero and writes return `false` when the address cannot be
//! accessed. Callers that need the error use [`TypedAccessor::read_value`]
//! or go through [`MemorySource`] directly.

use crate::core::types::{Address, MemoryResult, MemoryValue, Scalar, ValueKind};
use crate::memory::access::MemorySource;
use tracing::trace;

/// Typed view over a memory source
#[derive(Debug, Clone, Copy)]
pub struct TypedAccessor<'a, S> {
    source: &'a S,
}

macro_rules! typed_accessors {
    ($(($read:ident, $write:ident, $ty:ty)),* $(,)?) => {
        $(
            #[doc = concat!("Reads an `", stringify!($ty), "`, zero on failure")]
            pub fn $read(&self, address: Address) -> $ty {
                self.read::<$ty>(address)
            }

            #[doc = concat!("Writes an `", stringify!($ty), "`; `false` on failure")]
            pub fn $write(&self, address: Address, value: $ty) -> bool {
                self.write::<$ty>(address, value)
            }
        )*
    };
}

impl<'a, S: MemorySource> TypedAccessor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        TypedAccessor { source }
    }

    /// Reads a `T`, yielding `T::default()` when the read fails
    pub fn read<T: Scalar>(&self, address: Address) -> T {
        match self.source.read::<T>(address) {
            Ok(value) => value,
            Err(err) => {
                trace!(%address, error = %err, "typed read defaulted");
                T::default()
            }
        }
    }

    /// Writes a `T`, reporting success
    pub fn write<T: Scalar>(&self, address: Address, value: T) -> bool {
        match self.source.write(address, value) {
            Ok(()) => true,
            Err(err) => {
                trace!(%address, error = %err, "typed write failed");
                false
            }
        }
    }

    pub fn read_value(&self, address: Address, kind: ValueKind) -> MemoryResult<MemoryValue> {
        self.source.read_value(address, kind)
    }

    pub fn write_value(&self, address: Address, value: &MemoryValue) -> MemoryResult<()> {
        self.source.write_value(address, value)
    }

    typed_accessors!(
        (read_byte, write_byte, i8),
        (read_word, write_word, i16),
        (read_dword, write_dword, i32),
        (read_qword, write_qword, i64),
        (read_float, write_float, f32),
        (read_double, write_double, f64),
    );
}
