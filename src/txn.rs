//! Read-write transactions.

use crate::{
    internal::clock,
    item::{Item, ItemProxy},
    rcu,
    shared::Shared,
    stats,
    tx::Error,
};
use core::{
    cell::Cell,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};
use fxhash::FxHashMap;
use std::collections::hash_map::Entry;

/// A read-write transaction.
///
/// Container operations take `&mut RwTxn` and register [`Item`]s describing
/// what they read, wrote, or intend to change structurally; [`rw`]/[`try_rw`]
/// then drive the commit protocol over those items. Dropping a transaction
/// that has not committed rolls it back: every item receives its `cleanup`
/// callback with `committed = false`.
///
/// The `'env` lifetime ties registered containers to the transaction; it is
/// bound at the [`rw`]/[`try_rw`] call.
pub struct RwTxn<'env> {
    pub(crate) items: Vec<Item<'env>>,
    index:            FxHashMap<(usize, usize), usize>,
    start_version:    u64,
    pub(crate) commit_tid: Cell<u64>,
    pub(crate) completed:  bool,
    // Pinned for the whole transaction so raw node pointers stashed in item
    // keys stay dereferenceable through commit.
    _pin:   rcu::Guard,
    _marker: PhantomData<*mut ()>,
}

impl<'env> Debug for RwTxn<'env> {
    #[cold]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad("RwTxn { .. }")
    }
}

impl<'env> RwTxn<'env> {
    #[inline]
    fn new() -> Self {
        RwTxn {
            items: Vec::new(),
            index: FxHashMap::default(),
            start_version: clock::now(),
            commit_tid: Cell::new(0),
            completed: false,
            _pin: rcu::pin(),
            _marker: PhantomData,
        }
    }

    /// Get-or-create the transaction-local item scoped to `(owner, key)`.
    #[inline]
    pub fn item(&mut self, owner: &'env (dyn Shared + 'env), key: usize) -> ItemProxy<'_, 'env> {
        let owner_addr = owner as *const _ as *const () as usize;
        let index = match self.index.entry((owner_addr, key)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let index = self.items.len();
                self.items.push(Item::new(owner, key));
                *entry.insert(index)
            }
        };
        ItemProxy::new(self, index)
    }

    /// Item lookup without creation.
    #[inline]
    pub fn check_item(&self, owner: &(dyn Shared + '_), key: usize) -> Option<&Item<'env>> {
        let owner_addr = owner as *const _ as *const () as usize;
        self.index
            .get(&(owner_addr, key))
            .map(|&index| &self.items[index])
    }

    /// The global version clock value when this transaction began.
    #[inline]
    pub fn start_version(&self) -> u64 {
        self.start_version
    }

    /// Early consistency check: fails when `version` was published after
    /// this transaction began. Meaningful only against versions stamped
    /// with commit timestamps.
    #[inline]
    pub fn check_opacity(&self, version: u64) -> Result<(), Error> {
        if version > self.start_version {
            Err(Error::CONFLICT)
        } else {
            Ok(())
        }
    }

    /// This transaction's commit timestamp. Valid during `install`.
    #[inline]
    pub fn commit_tid(&self) -> u64 {
        let tid = self.commit_tid.get();
        debug_assert!(tid != 0, "`commit_tid` read outside of commit");
        tid
    }
}

impl<'env> Drop for RwTxn<'env> {
    fn drop(&mut self) {
        if !self.completed {
            self.rollback_in_place();
        }
    }
}

/// Runs `f` in a transaction, retrying until a commit succeeds.
///
/// # Examples
///
/// ```
/// let six_by_nine: u32 = optx::rw(|_tx| Ok(6 * 9));
/// assert_eq!(six_by_nine, 54);
/// ```
#[inline]
pub fn rw<'env, F, O>(mut f: F) -> O
where
    F: FnMut(&mut RwTxn<'env>) -> Result<O, Error>,
{
    loop {
        if let Ok(output) = try_rw(&mut f) {
            return output;
        }
    }
}

/// Runs `f` in a transaction, making a single attempt.
///
/// Conflicts — whether raised by `f` itself or detected at commit — surface
/// as `Err`; the transaction is rolled back either way.
#[inline]
pub fn try_rw<'env, F, O>(mut f: F) -> Result<O, Error>
where
    F: FnMut(&mut RwTxn<'env>) -> Result<O, Error>,
{
    let mut txn = RwTxn::new();
    let result = match f(&mut txn) {
        Ok(output) => txn.commit().map(|()| output),
        Err(error) => Err(error),
    };
    match result {
        Ok(_) => stats::record_commit(),
        Err(_) => stats::record_conflict(),
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::version::VersionLock;
    use core::sync::atomic::{
        AtomicU64,
        Ordering::{Acquire, Release},
    };
    use crossbeam_utils::thread;

    /// Minimal transactional register: one value, one version word.
    struct Register {
        value:   AtomicU64,
        version: VersionLock,
    }

    impl Register {
        fn new(value: u64) -> Self {
            Register {
                value:   AtomicU64::new(value),
                version: VersionLock::new(0),
            }
        }

        fn get<'env>(&'env self, txn: &mut RwTxn<'env>) -> Result<u64, Error> {
            let version = self.version.observe();
            let value = self.value.load(Acquire);
            let _ = txn.item(self, 0).observe(version);
            Ok(value)
        }

        fn set<'env>(&'env self, txn: &mut RwTxn<'env>, value: u64) -> Result<(), Error> {
            let _ = txn.item(self, 0).add_write(value);
            Ok(())
        }
    }

    impl Shared for Register {
        fn lock(&self, _item: &mut Item<'_>, _txn: &RwTxn<'_>) {
            self.version.lock();
        }

        fn check(&self, item: &Item<'_>, _txn: &RwTxn<'_>) -> bool {
            self.version.check(item.read_version(), item.needs_unlock())
        }

        fn install(&self, item: &mut Item<'_>, _txn: &RwTxn<'_>) {
            if let Some(value) = item.take_write::<u64>() {
                self.value.store(value, Release);
            }
            self.version.increment();
        }

        fn unlock(&self, _item: &mut Item<'_>) {
            self.version.unlock();
        }

        fn cleanup(&self, _item: &mut Item<'_>, _committed: bool) {}
    }

    #[test]
    fn read_only() {
        let register = Register::new(42);
        let value = rw(|txn| register.get(txn));
        assert_eq!(value, 42);
    }

    #[test]
    fn read_write() {
        let register = Register::new(0);
        rw(|txn| {
            let value = register.get(txn)?;
            register.set(txn, value + 1)
        });
        assert_eq!(rw(|txn| register.get(txn)), 1);
    }

    #[test]
    fn invalidated_read_aborts() {
        let register = Register::new(0);
        let result = try_rw(|txn| {
            let value = register.get(txn)?;
            // A competing transaction publishes before we commit.
            rw(|other| register.set(other, 100));
            register.set(txn, value + 1)
        });
        assert_eq!(result, Err(Error::CONFLICT));
        assert_eq!(rw(|txn| register.get(txn)), 100);
    }

    #[test]
    fn contended_increments() {
        const THREADS: usize = 8;
        const ITERS: usize = 1000;
        let register = Register::new(0);
        thread::scope(|scope| {
            for _ in 0..THREADS {
                let _ = scope.spawn(|_| {
                    for _ in 0..ITERS {
                        rw(|txn| {
                            let value = register.get(txn)?;
                            register.set(txn, value + 1)
                        });
                    }
                });
            }
        })
        .unwrap();
        assert_eq!(rw(|txn| register.get(txn)), (THREADS * ITERS) as u64);
    }
}
