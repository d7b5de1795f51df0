//! The commit driver.
//!
//! Per item, in a fixed order: lock (write-armed) → check (read-armed) →
//! install (write-armed) → unlock (locked) → cleanup (all, with the
//! outcome). Items are sorted by `(owner address, key)` before the lock
//! phase so transactions spanning several containers acquire their locks in
//! one global order.

use crate::{internal::clock, item::Item, tx::Error, txn::RwTxn};
use core::{
    mem,
    sync::atomic::{fence, Ordering::SeqCst},
};

impl<'env> RwTxn<'env> {
    /// The commit algorithm, called after user code has finished running
    /// without returning an error.
    #[inline]
    pub(crate) fn commit(mut self) -> Result<(), Error> {
        let result = self.commit_in_place();
        self.completed = true;
        result
    }

    fn commit_in_place(&mut self) -> Result<(), Error> {
        let mut items = mem::take(&mut self.items);
        items.sort_by_key(|item| (item.owner_addr(), item.key()));

        for item in items.iter_mut() {
            if item.has_write() {
                let owner = item.owner();
                owner.lock(item, self);
                item.set_locked();
            }
        }

        fence(SeqCst);
        self.commit_tid.set(clock::next_tid());

        let consistent = items
            .iter()
            .all(|item| !item.has_read() || item.owner().check(item, self));
        if !consistent {
            self.unwind(&mut items);
            return Err(Error::CONFLICT);
        }

        for item in items.iter_mut() {
            if item.has_write() {
                let owner = item.owner();
                owner.install(item, self);
            }
        }
        for item in items.iter_mut() {
            if item.needs_unlock() {
                let owner = item.owner();
                owner.unlock(item);
            }
        }
        for item in items.iter_mut() {
            let owner = item.owner();
            owner.cleanup(item, true);
        }
        Ok(())
    }

    #[cold]
    fn unwind(&self, items: &mut Vec<Item<'env>>) {
        for item in items.iter_mut() {
            if item.needs_unlock() {
                let owner = item.owner();
                owner.unlock(item);
            }
        }
        for item in items.iter_mut() {
            let owner = item.owner();
            owner.cleanup(item, false);
        }
    }

    /// Abort path: runs `cleanup(committed = false)` on every item so no
    /// speculative structure outlives the transaction.
    pub(crate) fn rollback_in_place(&mut self) {
        let mut items = mem::take(&mut self.items);
        for item in items.iter_mut() {
            let owner = item.owner();
            owner.cleanup(item, false);
        }
    }
}
