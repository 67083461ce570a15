//! Fault-recovery window for direct in-process copies
//!
//! A SIGSEGV/SIGBUS handler is installed once per process. While the
//! current thread is armed, a fault inside [`guarded_copy`] jumps back to
//! the checkpoint taken just before the copy and the copy reports failure.
//! Faults on a thread that is not armed are handed to the disposition that
//! was in place before ours, which normally terminates the process.

use libc::{c_int, c_void, siginfo_t};
use std::cell::{Cell, UnsafeCell};
use std::ptr;
use std::sync::atomic::{compiler_fence, Ordering};
use std::sync::{Once, OnceLock};
use tracing::{debug, warn};

const GUARDED_SIGNALS: [c_int; 2] = [libc::SIGSEGV, libc::SIGBUS];

/// Backing storage for a `sigjmp_buf`, larger than any libc layout in use.
#[repr(C, align(16))]
struct Checkpoint([u64; 64]);

extern "C" {
    #[cfg_attr(target_env = "gnu", link_name = "__sigsetjmp")]
    fn sigsetjmp(env: *mut Checkpoint, save_mask: c_int) -> c_int;
    fn siglongjmp(env: *mut Checkpoint, value: c_int) -> !;
}

thread_local! {
    static ARMED: Cell<bool> = const { Cell::new(false) };
    static CHECKPOINT: UnsafeCell<Checkpoint> = const { UnsafeCell::new(Checkpoint([0; 64])) };
}

static INSTALL: Once = Once::new();
static PREVIOUS: [OnceLock<libc::sigaction>; 2] = [OnceLock::new(), OnceLock::new()];

/// Installs the fault handler. Idempotent; later calls are no-ops.
pub fn install() {
    INSTALL.call_once(|| {
        for (slot, &signal) in PREVIOUS.iter().zip(GUARDED_SIGNALS.iter()) {
            unsafe {
                let mut previous: libc::sigaction = std::mem::zeroed();
                if libc::sigaction(signal, ptr::null(), &mut previous) != 0 {
                    warn!(signal, "could not query existing fault disposition");
                    continue;
                }
                let _ = slot.set(previous);

                let mut action: libc::sigaction = std::mem::zeroed();
                action.sa_sigaction = on_fault as usize;
                action.sa_flags = libc::SA_SIGINFO | libc::SA_ONSTACK;
                libc::sigemptyset(&mut action.sa_mask);
                if libc::sigaction(signal, &action, ptr::null_mut()) != 0 {
                    warn!(signal, "could not install fault handler");
                }
            }
        }
        debug!("fault handler installed for SIGSEGV and SIGBUS");
    });
}

pub fn is_installed() -> bool {
    INSTALL.is_completed()
}

/// Whether the calling thread is inside a guarded copy
pub fn is_armed() -> bool {
    ARMED.with(|armed| armed.get())
}

/// Copies `len` bytes from `src` to `dst`, surviving an invalid address on
/// either side. Returns `false` if the copy faulted.
///
/// # Safety
/// Addresses that are mapped must not alias memory Rust code currently
/// holds references to, and a partially completed copy may leave `dst`
/// modified up to the faulting byte.
#[inline(never)]
pub unsafe fn guarded_copy(dst: *mut u8, src: *const u8, len: usize) -> bool {
    install();

    let checkpoint = CHECKPOINT.with(|slot| slot.get());
    ARMED.with(|armed| armed.set(true));
    compiler_fence(Ordering::SeqCst);

    let completed = if sigsetjmp(checkpoint, 1) == 0 {
        volatile_copy(dst, src, len);
        true
    } else {
        false
    };

    compiler_fence(Ordering::SeqCst);
    ARMED.with(|armed| armed.set(false));
    completed
}

unsafe fn volatile_copy(dst: *mut u8, src: *const u8, len: usize) {
    for i in 0..len {
        ptr::write_volatile(dst.add(i), ptr::read_volatile(src.add(i)));
    }
}

extern "C" fn on_fault(signal: c_int, info: *mut siginfo_t, context: *mut c_void) {
    if ARMED.with(|armed| armed.replace(false)) {
        let checkpoint = CHECKPOINT.with(|slot| slot.get());
        unsafe { siglongjmp(checkpoint, 1) }
    }
    unsafe { forward(signal, info, context) }
}

/// Hands an unguarded fault to the previous disposition
unsafe fn forward(signal: c_int, info: *mut siginfo_t, context: *mut c_void) {
    let previous = GUARDED_SIGNALS
        .iter()
        .position(|&guarded| guarded == signal)
        .and_then(|index| PREVIOUS[index].get());

    match previous {
        Some(action)
            if action.sa_sigaction != libc::SIG_DFL && action.sa_sigaction != libc::SIG_IGN =>
        {
            if action.sa_flags & libc::SA_SIGINFO != 0 {
                let handler: extern "C" fn(c_int, *mut siginfo_t, *mut c_void) =
                    std::mem::transmute(action.sa_sigaction);
                handler(signal, info, context);
            } else {
                let handler: extern "C" fn(c_int) = std::mem::transmute(action.sa_sigaction);
                handler(signal);
            }
        }
        _ => {
            // Returning re-executes the access under the default action
            libc::signal(signal, libc::SIG_DFL);
        }
    }
}
