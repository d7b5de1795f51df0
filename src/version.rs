//! A lockable version word.
//!
//! [`VersionLock`] packs a logical clock and a write lock into one
//! `AtomicU64`: the top bit is the lock bit, the remaining bits are the
//! version. Containers advance the version on every committed structural
//! change, and commit-time readers compare a previously observed value
//! against the current one to detect conflicts.

use core::{
    fmt::{self, Debug, Formatter},
    sync::atomic::{
        AtomicU64,
        Ordering::{Acquire, Relaxed, Release},
    },
};
use crossbeam_utils::Backoff;

const LOCK_BIT: u64 = 1 << 63;

#[inline]
const fn lock_bit_set(v: u64) -> bool {
    v & LOCK_BIT != 0
}

#[inline]
const fn as_unlocked(v: u64) -> u64 {
    v & !LOCK_BIT
}

pub struct VersionLock(AtomicU64);

impl Debug for VersionLock {
    #[inline(never)]
    #[cold]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let v = self.0.load(Relaxed);
        f.debug_struct("VersionLock")
            .field("locked", &lock_bit_set(v))
            .field("version", &as_unlocked(v))
            .finish()
    }
}

impl VersionLock {
    #[inline]
    pub const fn new(version: u64) -> Self {
        VersionLock(AtomicU64::new(version))
    }

    /// The current version, ignoring the lock bit.
    ///
    /// An observation taken while another transaction holds the lock is
    /// permitted; if that transaction goes on to publish, the version moves
    /// and the observer fails [`check`](VersionLock::check) at commit.
    #[inline]
    pub fn observe(&self) -> u64 {
        as_unlocked(self.0.load(Acquire))
    }

    /// Acquires the write lock, spinning until it is available.
    #[inline]
    pub fn lock(&self) {
        let backoff = Backoff::new();
        loop {
            let v = self.0.load(Relaxed);
            if !lock_bit_set(v)
                && self
                    .0
                    .compare_exchange_weak(v, v | LOCK_BIT, Acquire, Relaxed)
                    .is_ok()
            {
                return;
            }
            backoff.snooze();
        }
    }

    #[inline]
    pub fn unlock(&self) {
        let _prev = self.0.fetch_and(!LOCK_BIT, Release);
        debug_assert!(
            lock_bit_set(_prev),
            "attempt to unlock an unlocked `VersionLock`"
        );
    }

    /// Commit-time validation of a previous observation.
    ///
    /// Fails when the word is locked by someone other than the caller, or
    /// when the version has moved since `observed` was taken.
    #[inline]
    pub fn check(&self, observed: u64, held: bool) -> bool {
        let v = self.0.load(Acquire);
        if lock_bit_set(v) && !held {
            return false;
        }
        as_unlocked(v) == observed
    }

    /// Stamps the version with a commit timestamp. The lock must be held.
    #[inline]
    pub fn set(&self, tid: u64) {
        debug_assert!(
            lock_bit_set(self.0.load(Relaxed)),
            "`VersionLock::set` without holding the lock"
        );
        debug_assert!(!lock_bit_set(tid), "commit timestamp overflowed the version bits");
        self.0.store(tid | LOCK_BIT, Release);
    }

    /// Bumps the version by one. The lock must be held.
    #[inline]
    pub fn increment(&self) {
        debug_assert!(
            lock_bit_set(self.0.load(Relaxed)),
            "`VersionLock::increment` without holding the lock"
        );
        let _prev = self.0.fetch_add(1, Release);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn send_sync<T: Send + Sync>() {}

    #[test]
    fn is_send_sync() {
        send_sync::<VersionLock>()
    }

    #[test]
    fn observe_ignores_lock_bit() {
        let v = VersionLock::new(7);
        assert_eq!(v.observe(), 7);
        v.lock();
        assert_eq!(v.observe(), 7);
        v.unlock();
    }

    #[test]
    fn check_fails_on_move() {
        let v = VersionLock::new(0);
        let observed = v.observe();
        v.lock();
        assert!(!v.check(observed, false), "locked elsewhere must fail");
        assert!(v.check(observed, true), "holder sees its own observation");
        v.increment();
        v.unlock();
        assert!(!v.check(observed, false));
        assert!(v.check(v.observe(), false));
    }

    #[test]
    fn set_stamps_commit_tid() {
        let v = VersionLock::new(3);
        v.lock();
        v.set(1234);
        assert!(v.check(1234, true));
        v.unlock();
        assert_eq!(v.observe(), 1234);
    }
}
