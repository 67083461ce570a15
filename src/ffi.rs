//! C ABI over [`Session`]
//!
//! [`memscan_init`] returns an opaque owned handle that every other call
//! takes as its first argument and [`memscan_close`] frees. Calls on one
//! handle must be serialised by the caller. A null handle is accepted
//! everywhere: reads yield zero, counts yield zero and searches, filters
//! and writes report `false`.

use crate::core::types::{Address, ComparisonType};
use crate::session::Session;
use libc::c_int;
use std::ptr;

/// Opaque session handle
pub type MemscanHandle = *mut Session;

fn xor_key(is_xor: bool, key: u64) -> Option<u64> {
    is_xor.then_some(key)
}

/// Opens a session on the calling process.
///
/// The handle must be released with [`memscan_close`].
#[no_mangle]
pub extern "C" fn memscan_init() -> MemscanHandle {
    Box::into_raw(Box::new(Session::open()))
}

/// Clears all state and frees the handle.
///
/// # Safety
/// `handle` must be null or a live handle from [`memscan_init`]; it is
/// invalid after this call.
#[no_mangle]
pub unsafe extern "C" fn memscan_close(handle: MemscanHandle) {
    if handle.is_null() {
        return;
    }
    let mut session = Box::from_raw(handle);
    session.close();
}

/// Rebuilds the region catalog and returns its size.
///
/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn memscan_refresh_regions(handle: MemscanHandle) -> usize {
    match handle.as_mut() {
        Some(session) => session.refresh_regions().unwrap_or(0),
        None => 0,
    }
}

/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn memscan_region_count(handle: MemscanHandle) -> usize {
    handle.as_ref().map_or(0, Session::region_count)
}

macro_rules! ffi_search_filter {
    ($(($search:ident, $filter:ident, $ty:ty)),* $(,)?) => {
        $(
            #[doc = concat!("Searches eligible regions for a `", stringify!($ty), "`.")]
            ///
            /// # Safety
            /// `handle` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $search(
                handle: MemscanHandle,
                value: $ty,
                is_xor: bool,
                key: u64,
            ) -> bool {
                match handle.as_mut() {
                    Some(session) => session.search(value, xor_key(is_xor, key)).is_ok(),
                    None => false,
                }
            }

            #[doc = concat!("Narrows the results by re-reading each as a `", stringify!($ty), "`.")]
            ///
            /// Unknown `condition` selectors compare for equality.
            ///
            /// # Safety
            /// `handle` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $filter(
                handle: MemscanHandle,
                value: $ty,
                condition: c_int,
                is_xor: bool,
                key: u64,
            ) -> bool {
                let predicate = ComparisonType::from_selector(condition);
                match handle.as_mut() {
                    Some(session) => session.filter(predicate, value, xor_key(is_xor, key)).is_ok(),
                    None => false,
                }
            }
        )*
    };
}

ffi_search_filter!(
    (memscan_search_byte, memscan_filter_byte, i8),
    (memscan_search_word, memscan_filter_word, i16),
    (memscan_search_dword, memscan_filter_dword, i32),
    (memscan_search_qword, memscan_filter_qword, i64),
    (memscan_search_float, memscan_filter_float, f32),
    (memscan_search_double, memscan_filter_double, f64),
);

/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn memscan_result_count(handle: MemscanHandle) -> usize {
    handle.as_ref().map_or(0, |session| session.results().len())
}

/// Copies up to `count` result addresses starting at `offset` into `out`.
///
/// The page is clamped to the result set and to `out_len`; the number of
/// addresses written is returned.
///
/// # Safety
/// `handle` must be null or a live handle, and `out` must be null or valid
/// for `out_len` writes.
#[no_mangle]
pub unsafe extern "C" fn memscan_get_results(
    handle: MemscanHandle,
    offset: usize,
    count: usize,
    out: *mut usize,
    out_len: usize,
) -> usize {
    let Some(session) = handle.as_ref() else {
        return 0;
    };
    if out.is_null() {
        return 0;
    }
    let page = session.results().page(offset, count.min(out_len));
    for (i, address) in page.iter().enumerate() {
        ptr::write(out.add(i), address.as_usize());
    }
    page.len()
}

/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn memscan_clear_results(handle: MemscanHandle) {
    if let Some(session) = handle.as_mut() {
        session.clear_results();
    }
}

/// Kind id (0-5) of the last search, or -1 before any search.
///
/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn memscan_search_type(handle: MemscanHandle) -> c_int {
    handle
        .as_ref()
        .and_then(Session::search_kind)
        .map_or(-1, |kind| kind.id())
}

/// Whether the last search stopped at the result cap.
///
/// # Safety
/// `handle` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn memscan_results_truncated(handle: MemscanHandle) -> bool {
    handle
        .as_ref()
        .map_or(false, |session| session.results().is_truncated())
}

macro_rules! ffi_accessors {
    ($(($read:ident, $write:ident, $ty:ty)),* $(,)?) => {
        $(
            #[doc = concat!("Reads an `", stringify!($ty), "`; zero on failure.")]
            ///
            /// # Safety
            /// `handle` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $read(handle: MemscanHandle, address: usize) -> $ty {
                handle
                    .as_ref()
                    .map_or(<$ty>::default(), |session| session.read::<$ty>(Address::new(address)))
            }

            #[doc = concat!("Writes an `", stringify!($ty), "`; `false` on failure.")]
            ///
            /// # Safety
            /// `handle` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $write(handle: MemscanHandle, address: usize, value: $ty) -> bool {
                handle
                    .as_ref()
                    .map_or(false, |session| session.write(Address::new(address), value))
            }
        )*
    };
}

ffi_accessors!(
    (memscan_read_byte, memscan_write_byte, i8),
    (memscan_read_word, memscan_write_word, i16),
    (memscan_read_dword, memscan_write_dword, i32),
    (memscan_read_qword, memscan_write_qword, i64),
    (memscan_read_float, memscan_write_float, f32),
    (memscan_read_double, memscan_write_double, f64),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_is_tolerated() {
        let null = ptr::null_mut();
        unsafe {
            assert_eq!(memscan_refresh_regions(null), 0);
            assert_eq!(memscan_region_count(null), 0);
            assert!(!memscan_search_dword(null, 1, false, 0));
            assert!(!memscan_filter_float(null, 1.0, 0, false, 0));
            assert_eq!(memscan_result_count(null), 0);
            assert_eq!(memscan_search_type(null), -1);
            assert!(!memscan_results_truncated(null));
            assert_eq!(memscan_read_qword(null, 0x1000), 0);
            assert!(!memscan_write_byte(null, 0x1000, 1));
            memscan_clear_results(null);
            memscan_close(null);

            let mut out = [0usize; 4];
            assert_eq!(memscan_get_results(null, 0, 4, out.as_mut_ptr(), out.len()), 0);
        }
    }

    #[test]
    fn test_xor_key_only_when_flagged() {
        assert_eq!(xor_key(false, 7), None);
        assert_eq!(xor_key(true, 7), Some(7));
    }
}
