//! The structure lock.
//!
//! A minimal spinning mutex guarding head/next pointer writes. Hold times
//! are a handful of stores, so spinning beats parking; the lock is never
//! held across a commit.

use core::sync::atomic::{
    AtomicBool,
    Ordering::{Acquire, Relaxed, Release},
};
use crossbeam_utils::Backoff;
use lock_api::{GuardNoSend, RawMutex};

pub(crate) struct RawSpin {
    locked: AtomicBool,
}

unsafe impl RawMutex for RawSpin {
    const INIT: RawSpin = RawSpin {
        locked: AtomicBool::new(false),
    };
    type GuardMarker = GuardNoSend;

    #[inline]
    fn lock(&self) {
        if self
            .locked
            .compare_exchange_weak(false, true, Acquire, Relaxed)
            .is_err()
        {
            self.lock_slow();
        }
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Acquire, Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn unlock(&self) {
        self.locked.store(false, Release);
    }
}

impl RawSpin {
    #[cold]
    #[inline(never)]
    fn lock_slow(&self) {
        let backoff = Backoff::new();
        loop {
            if !self.locked.load(Relaxed)
                && self
                    .locked
                    .compare_exchange_weak(false, true, Acquire, Relaxed)
                    .is_ok()
            {
                return;
            }
            backoff.snooze();
        }
    }
}

pub(crate) type SpinLock<T> = lock_api::Mutex<RawSpin, T>;
