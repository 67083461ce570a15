//! Safe memory access: the single path every read and write goes through
//!
//! [`SafeAccess`] tries the kernel transfer syscalls first and falls back
//! to a fault-guarded in-process copy when the target is the calling
//! process. Both failing is an ordinary `Err`, never a crash.

pub mod fault;
pub mod transfer;

use crate::core::types::{Address, MemoryError, MemoryResult, MemoryValue, Pid, Scalar, ValueKind};
use tracing::trace;

/// Something the scanner, filter and accessors can read from and write to
pub trait MemorySource: Sync {
    /// Fills `buffer` from `address`; all-or-nothing
    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()>;

    /// Writes all of `data` at `address`
    fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<()>;

    /// Reads one element of type `T`
    fn read<T: Scalar>(&self, address: Address) -> MemoryResult<T>
    where
        Self: Sized,
    {
        let mut raw = [0u8; 8];
        let raw = &mut raw[..T::WIDTH];
        self.read_into(address, raw)?;
        Ok(T::from_ne_slice(raw))
    }

    /// Writes one element of type `T`
    fn write<T: Scalar>(&self, address: Address, value: T) -> MemoryResult<()>
    where
        Self: Sized,
    {
        let mut raw = [0u8; 8];
        value.write_ne(&mut raw);
        self.write_from(address, &raw[..T::WIDTH])
    }

    /// Reads a value of a runtime-selected kind
    fn read_value(&self, address: Address, kind: ValueKind) -> MemoryResult<MemoryValue>
    where
        Self: Sized,
    {
        Ok(match kind {
            ValueKind::Byte => self.read::<i8>(address)?.into_value(),
            ValueKind::Word => self.read::<i16>(address)?.into_value(),
            ValueKind::Dword => self.read::<i32>(address)?.into_value(),
            ValueKind::Qword => self.read::<i64>(address)?.into_value(),
            ValueKind::Float => self.read::<f32>(address)?.into_value(),
            ValueKind::Double => self.read::<f64>(address)?.into_value(),
        })
    }

    /// Writes a value using its own width
    fn write_value(&self, address: Address, value: &MemoryValue) -> MemoryResult<()>
    where
        Self: Sized,
    {
        self.write_from(address, &value.to_bytes())
    }
}

/// Dual-strategy access to one process's memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeAccess {
    pid: Pid,
    in_process: bool,
}

impl SafeAccess {
    /// Access to the calling process; installs the fault handler
    pub fn current() -> Self {
        fault::install();
        SafeAccess {
            pid: unsafe { libc::getpid() },
            in_process: true,
        }
    }

    /// Access to another process; only the transfer syscalls are used
    pub fn for_pid(pid: Pid) -> Self {
        let own = unsafe { libc::getpid() };
        if pid == own {
            return Self::current();
        }
        SafeAccess {
            pid,
            in_process: false,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Whether the guarded direct copy is available as a fallback
    pub fn has_direct_fallback(&self) -> bool {
        self.in_process
    }

    fn check_span(address: Address, len: usize) -> MemoryResult<()> {
        if address.checked_add(len).is_none() {
            return Err(MemoryError::InvalidAddress(format!(
                "{} + {} overflows the address space",
                address, len
            )));
        }
        Ok(())
    }
}

impl MemorySource for SafeAccess {
    fn read_into(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        Self::check_span(address, buffer.len())?;

        match transfer::read(self.pid, address, buffer) {
            Ok(count) if count == buffer.len() => return Ok(()),
            Ok(count) => trace!(%address, count, wanted = buffer.len(), "short transfer read"),
            Err(err) => trace!(%address, error = %err, "transfer read failed"),
        }

        if !self.in_process {
            return Err(MemoryError::read_failed(address, "transfer failed"));
        }

        let copied =
            unsafe { fault::guarded_copy(buffer.as_mut_ptr(), address.as_ptr(), buffer.len()) };
        if copied {
            Ok(())
        } else {
            Err(MemoryError::read_failed(address, "guarded copy faulted"))
        }
    }

    fn write_from(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        Self::check_span(address, data.len())?;

        match transfer::write(self.pid, address, data) {
            Ok(count) if count == data.len() => return Ok(()),
            Ok(count) => trace!(%address, count, wanted = data.len(), "short transfer write"),
            Err(err) => trace!(%address, error = %err, "transfer write failed"),
        }

        if !self.in_process {
            return Err(MemoryError::write_failed(address, "transfer failed"));
        }

        let copied = unsafe { fault::guarded_copy(address.as_mut_ptr(), data.as_ptr(), data.len()) };
        if copied {
            Ok(())
        } else {
            Err(MemoryError::write_failed(address, "guarded copy faulted"))
        }
    }
}
