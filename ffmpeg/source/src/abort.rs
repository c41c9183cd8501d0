/*!
    Cross-thread cancellation of blocking reads.
*/

use std::ffi::{c_int, c_void};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/**
    Shared abort flag of a [`Demuxer`](crate::Demuxer).

    The flag is level-triggered: once set it stays set, and every read
    returns immediately, until it is cleared with `abort(false)`. It is
    polled by the I/O layer on every chunk transfer, so setting it from
    another thread interrupts a blocked read promptly.
*/
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    /**
        Set (`true`) or clear (`false`) the abort flag.
    */
    pub fn abort(&self, stop: bool) {
        self.flag.store(stop, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /**
        Opaque pointer for [`interrupt_callback`].

        Valid for as long as any clone of this handle is alive.
    */
    pub(crate) fn as_opaque(&self) -> *mut c_void {
        Arc::as_ptr(&self.flag) as *mut c_void
    }
}

/**
    FFmpeg interrupt callback, returns non-zero to abort blocking I/O.
*/
pub(crate) unsafe extern "C" fn interrupt_callback(opaque: *mut c_void) -> c_int {
    if opaque.is_null() {
        return 0;
    }
    // SAFETY: `opaque` comes from `AbortHandle::as_opaque` and the session
    // holding the format context keeps a clone of the handle alive.
    let flag = unsafe { &*(opaque as *const AtomicBool) };
    flag.load(Ordering::Acquire) as c_int
}
