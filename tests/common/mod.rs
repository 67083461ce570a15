//! Shared fixtures for integration tests

#![allow(dead_code)]

use memscan::{Address, Config, Scalar, Session};
use std::ptr;

/// Anonymous read-write mapping a session can be pointed at
pub struct Arena {
    base: *mut u8,
    len: usize,
}

impl Arena {
    pub fn new(len: usize) -> Self {
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        assert_ne!(base, libc::MAP_FAILED, "mmap failed");
        Arena {
            base: base as *mut u8,
            len,
        }
    }

    pub fn base(&self) -> usize {
        self.base as usize
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn address(&self, offset: usize) -> Address {
        Address::new(self.base() + offset)
    }

    pub fn plant<T: Scalar>(&self, offset: usize, value: T) {
        assert!(offset + T::WIDTH <= self.len);
        let mut raw = [0u8; 8];
        value.write_ne(&mut raw);
        unsafe {
            ptr::copy_nonoverlapping(raw.as_ptr(), self.base.add(offset), T::WIDTH);
        }
    }

    pub fn fill<T: Scalar>(&self, value: T) {
        for offset in (0..self.len).step_by(T::WIDTH) {
            self.plant(offset, value);
        }
    }

    /// Configuration whose scans cover exactly this arena
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.regions.anon_min_size = 0;
        config.regions.anon_max_size = usize::MAX;
        config.regions.address_range = Some((self.base(), self.base() + self.len));
        config
    }

    /// A session opened after the mapping exists, scanning only the arena
    pub fn session(&self) -> Session {
        Session::init(self.config()).expect("arena config is valid")
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.base as *mut libc::c_void, self.len);
        }
    }
}

/// A page that faults on any access
pub struct GuardPage(*mut libc::c_void);

impl GuardPage {
    pub fn new() -> Self {
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                4096,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        assert_ne!(ptr, libc::MAP_FAILED, "mmap failed");
        GuardPage(ptr)
    }

    pub fn address(&self) -> Address {
        Address::new(self.0 as usize)
    }
}

impl Drop for GuardPage {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.0, 4096);
        }
    }
}
