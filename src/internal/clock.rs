//! The global commit clock.
//!
//! Transactions snapshot the clock at start; committing transactions draw
//! their timestamp from it. Opacity-mode containers stamp their version
//! words with these timestamps, which is what makes
//! `RwTxn::check_opacity` comparisons meaningful.

use core::sync::atomic::{
    AtomicU64,
    Ordering::{Acquire, SeqCst},
};

static CLOCK: AtomicU64 = AtomicU64::new(0);

#[inline]
pub(crate) fn now() -> u64 {
    CLOCK.load(Acquire)
}

#[inline]
pub(crate) fn next_tid() -> u64 {
    CLOCK.fetch_add(1, SeqCst) + 1
}
