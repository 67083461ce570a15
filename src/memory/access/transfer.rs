//! Cross-process transfer through `process_vm_readv` / `process_vm_writev`
//!
//! The kernel validates the remote range itself and reports a short or
//! failed transfer instead of raising a fault, so this is the primary path.

use crate::core::types::{Address, Pid};
use libc::{c_ulong, c_void, iovec};
use std::io;

/// Copies `buffer.len()` bytes from `address` in `pid` into `buffer`.
///
/// Returns the number of bytes actually transferred.
pub fn read(pid: Pid, address: Address, buffer: &mut [u8]) -> io::Result<usize> {
    let local = [iovec {
        iov_base: buffer.as_mut_ptr() as *mut c_void,
        iov_len: buffer.len(),
    }];
    let remote = [iovec {
        iov_base: address.as_mut_ptr::<c_void>(),
        iov_len: buffer.len(),
    }];

    let transferred = unsafe {
        libc::process_vm_readv(
            pid,
            local.as_ptr(),
            local.len() as c_ulong,
            remote.as_ptr(),
            remote.len() as c_ulong,
            0,
        )
    };

    if transferred < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(transferred as usize)
}

/// Copies `data` to `address` in `pid`. Returns the bytes transferred.
pub fn write(pid: Pid, address: Address, data: &[u8]) -> io::Result<usize> {
    let local = [iovec {
        iov_base: data.as_ptr() as *mut c_void,
        iov_len: data.len(),
    }];
    let remote = [iovec {
        iov_base: address.as_mut_ptr::<c_void>(),
        iov_len: data.len(),
    }];

    let transferred = unsafe {
        libc::process_vm_writev(
            pid,
            local.as_ptr(),
            local.len() as c_ulong,
            remote.as_ptr(),
            remote.len() as c_ulong,
            0,
        )
    };

    if transferred < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(transferred as usize)
}
