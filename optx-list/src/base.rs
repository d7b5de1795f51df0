use crate::{
    spin::SpinLock,
    Compare, OrdCompare,
};
use core::{
    cell::UnsafeCell,
    cmp::Ordering::{Equal, Greater},
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem, ptr,
    ptr::NonNull,
    sync::atomic::{
        fence, AtomicPtr, AtomicUsize,
        Ordering::{Acquire, Relaxed, Release},
    },
};
use optx::{rcu, tx::Error, Item, RwTxn, Shared, VersionLock};

/// Invalid bit, packed into the low bit of the next word. Set on a node that
/// is either reserved by an uncommitted insert or tombstoned by a remove.
const INVALID_BIT: usize = 1;
const FLAG_MASK: usize = INVALID_BIT;

/// Sentinel item key standing for the list's whole structure; carries the
/// size-version observation and the commit-time lock intent.
const LIST_KEY: usize = 0;
/// Sentinel item key whose stash accumulates this transaction's size delta.
const SIZE_KEY: usize = 1;

const INSERT: u8 = Item::USER0;
const DELETE: u8 = Item::USER0 << 1;
const UPDATE: u8 = Item::USER0 << 2;

/// Next pointer plus flag bits in one atomic word.
struct TaggedNext<T> {
    word:    AtomicUsize,
    _marker: PhantomData<*mut Node<T>>,
}

unsafe impl<T: Send + Sync> Send for TaggedNext<T> {}
unsafe impl<T: Send + Sync> Sync for TaggedNext<T> {}

impl<T> TaggedNext<T> {
    #[inline]
    fn new(next: *mut Node<T>, flags: usize) -> Self {
        debug_assert_eq!(next as usize & FLAG_MASK, 0, "unaligned node pointer");
        TaggedNext {
            word:    AtomicUsize::new(next as usize | flags),
            _marker: PhantomData,
        }
    }

    #[inline]
    fn ptr(&self) -> *mut Node<T> {
        (self.word.load(Acquire) & !FLAG_MASK) as *mut Node<T>
    }

    /// Replaces the pointer, preserving concurrently edited flag bits.
    #[inline]
    fn assign_ptr(&self, next: *mut Node<T>) {
        debug_assert_eq!(next as usize & FLAG_MASK, 0, "unaligned node pointer");
        let _ = self
            .word
            .fetch_update(Release, Relaxed, |word| {
                Some(next as usize | (word & FLAG_MASK))
            });
    }

    #[inline]
    fn or_flags(&self, flags: usize) {
        let _ = self.word.fetch_or(flags, Release);
    }

    #[inline]
    fn clear_flags(&self, flags: usize) {
        let _ = self.word.fetch_and(!flags, Release);
    }

    #[inline]
    fn flags(&self) -> usize {
        self.word.load(Acquire) & FLAG_MASK
    }
}

struct Node<T> {
    // Overwritten in place by a committing update while readers may be mid
    // traversal; the commit protocol is what gives value reads meaning.
    val:  UnsafeCell<T>,
    next: TaggedNext<T>,
}

impl<T> Node<T> {
    #[inline]
    fn alloc(val: T, next: *mut Node<T>, speculative: bool) -> *mut Node<T> {
        let flags = if speculative { INVALID_BIT } else { 0 };
        Box::into_raw(Box::new(Node {
            val:  UnsafeCell::new(val),
            next: TaggedNext::new(next, flags),
        }))
    }

    #[inline]
    fn mark_invalid(&self) {
        self.next.or_flags(INVALID_BIT);
    }

    #[inline]
    fn mark_valid(&self) {
        self.next.clear_flags(INVALID_BIT);
    }

    #[inline]
    fn is_valid(&self) -> bool {
        self.next.flags() & INVALID_BIT == 0
    }

    #[inline]
    unsafe fn value(&self) -> &T {
        &*self.val.get()
    }
}

enum RawInsert<T> {
    Inserted(*mut Node<T>),
    /// An equal node already exists; ownership of the rejected value comes
    /// back to the caller.
    Found {
        node:  *mut Node<T>,
        value: T,
    },
}

/// A transactional singly-linked list.
///
/// Configuration is fixed per instance at the type level: `SORTED` orders
/// elements by `C`; `DUPLICATES` admits `compare`-equal elements;
/// `OPACITY` stamps the size-version with commit timestamps instead of a
/// monotonic counter, enabling early consistency checks.
///
/// Transactional operations take `&mut RwTxn` and are speculative until the
/// transaction commits; the `nontrans_*` surface applies immediately and
/// requires `&mut self` where it mutates.
pub struct TList<
    T,
    C = OrdCompare,
    const SORTED: bool = true,
    const DUPLICATES: bool = false,
    const OPACITY: bool = false,
> {
    head:         AtomicPtr<Node<T>>,
    count:        AtomicUsize,
    structure:    SpinLock<()>,
    size_version: VersionLock,
    comp:         C,
    _marker:      PhantomData<Box<Node<T>>>,
}

unsafe impl<T, C, const S: bool, const D: bool, const O: bool> Send for TList<T, C, S, D, O>
where
    T: Send,
    C: Send,
{
}

unsafe impl<T, C, const S: bool, const D: bool, const O: bool> Sync for TList<T, C, S, D, O>
where
    T: Send + Sync,
    C: Sync,
{
}

impl<T, C, const S: bool, const D: bool, const O: bool> Debug for TList<T, C, S, D, O> {
    #[cold]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TList")
            .field("len", &self.count.load(Relaxed))
            .field("sorted", &S)
            .field("duplicates", &D)
            .finish()
    }
}

impl<T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool> Default
    for TList<T, C, SORTED, DUPLICATES, OPACITY>
where
    C: Compare<T> + Default,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool>
    TList<T, C, SORTED, DUPLICATES, OPACITY>
where
    C: Compare<T>,
{
    #[inline]
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_compare(C::default())
    }

    #[inline]
    pub fn with_compare(comp: C) -> Self {
        TList {
            head:         AtomicPtr::new(ptr::null_mut()),
            count:        AtomicUsize::new(0),
            structure:    SpinLock::new(()),
            size_version: VersionLock::new(0),
            comp,
            _marker:      PhantomData,
        }
    }

    /// Unsynchronized element count: visible nodes only, no transactional
    /// delta applied.
    #[inline]
    pub fn nontrans_len(&self) -> usize {
        self.count.load(Relaxed)
    }

    /// Immediate lookup, outside any transaction.
    pub fn nontrans_find(&self, key: &T) -> Option<T>
    where
        T: Clone,
    {
        let _pin = rcu::pin();
        let found = self.raw_find(key);
        if found.is_null() {
            None
        } else {
            Some(unsafe { (*found).value().clone() })
        }
    }

    /// Immediate insert. Returns `false` when `DUPLICATES` is off and an
    /// equal element already exists.
    pub fn nontrans_insert(&mut self, value: T) -> bool {
        matches!(self.raw_insert(value, false), RawInsert::Inserted(_))
    }

    /// Immediate remove of the first element equal to `key`.
    pub fn nontrans_remove(&mut self, key: &T) -> bool {
        let mut prev: *mut Node<T> = ptr::null_mut();
        let mut cur = *self.head.get_mut();
        while !cur.is_null() {
            let node = unsafe { &*cur };
            match self.comp.compare(unsafe { node.value() }, key) {
                Equal => {
                    node.mark_invalid();
                    let next = node.next.ptr();
                    if prev.is_null() {
                        *self.head.get_mut() = next;
                    } else {
                        unsafe { &*prev }.next.assign_ptr(next);
                    }
                    *self.count.get_mut() -= 1;
                    drop(unsafe { Box::from_raw(cur) });
                    return true;
                }
                Greater if SORTED => return false,
                _ => {
                    prev = cur;
                    cur = node.next.ptr();
                }
            }
        }
        false
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        let mut cur = mem::replace(self.head.get_mut(), ptr::null_mut());
        while !cur.is_null() {
            let next = unsafe { (*cur).next.ptr() };
            drop(unsafe { Box::from_raw(cur) });
            cur = next;
        }
        *self.count.get_mut() = 0;
    }

    /// Iterates visible elements outside any transaction. The iterator pins
    /// the reclamation epoch for its lifetime.
    #[inline]
    pub fn nontrans_iter(&self) -> Iter<'_, T, C, SORTED, DUPLICATES, OPACITY> {
        Iter {
            cur:     self.head.load(Acquire),
            _pin:    rcu::pin(),
            _marker: PhantomData,
        }
    }

    /// Traversal from head. Sorted lists stop at the first strictly greater
    /// element.
    fn raw_find(&self, key: &T) -> *mut Node<T> {
        let mut cur = self.head.load(Acquire);
        while !cur.is_null() {
            let node = unsafe { &*cur };
            match self.comp.compare(unsafe { node.value() }, key) {
                Equal => return cur,
                Greater if SORTED => return ptr::null_mut(),
                _ => cur = node.next.ptr(),
            }
        }
        ptr::null_mut()
    }

    /// Structural insert under the structure lock. Speculative nodes are
    /// born invalid and published only by a committing install; they also
    /// leave `count` untouched until then.
    fn raw_insert(&self, value: T, speculative: bool) -> RawInsert<T> {
        let _guard = self.structure.lock();
        if !SORTED && DUPLICATES {
            let node = Node::alloc(value, self.head.load(Relaxed), speculative);
            self.head.store(node, Release);
            if !speculative {
                let _ = self.count.fetch_add(1, Relaxed);
            }
            return RawInsert::Inserted(node);
        }
        let mut prev: *mut Node<T> = ptr::null_mut();
        let mut cur = self.head.load(Relaxed);
        while !cur.is_null() {
            let node = unsafe { &*cur };
            match self.comp.compare(unsafe { node.value() }, &value) {
                Equal if !DUPLICATES => return RawInsert::Found { node: cur, value },
                Greater if SORTED => break,
                _ => {
                    prev = cur;
                    cur = node.next.ptr();
                }
            }
        }
        let node = Node::alloc(value, cur, speculative);
        if prev.is_null() {
            self.head.store(node, Release);
        } else {
            unsafe { &*prev }.next.assign_ptr(node);
        }
        if !speculative {
            let _ = self.count.fetch_add(1, Relaxed);
        }
        RawInsert::Inserted(node)
    }
}

impl<T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool>
    TList<T, C, SORTED, DUPLICATES, OPACITY>
where
    T: Send + Sync + 'static,
    C: Compare<T> + Send + Sync,
{
    /// Runs `f` as a transaction against this list, retrying on conflict.
    #[inline]
    pub fn atomic<'env, F, O>(&'env self, f: F) -> O
    where
        F: FnMut(&mut RwTxn<'env>) -> Result<O, Error>,
    {
        optx::rw(f)
    }

    /// Transactional lookup.
    ///
    /// A hit witnesses the node's presence; a miss witnesses the whole
    /// structure through the size-version, so any concurrent structural
    /// commit aborts this transaction at its own commit.
    pub fn find<'env>(&'env self, txn: &mut RwTxn<'env>, key: &T) -> Result<Option<T>, Error>
    where
        T: Clone,
    {
        let found = self.locate(txn, key)?;
        Ok(found.map(|node| unsafe { node.as_ref().value() }.clone()))
    }

    /// Transactional membership test.
    pub fn contains<'env>(&'env self, txn: &mut RwTxn<'env>, key: &T) -> Result<bool, Error> {
        Ok(self.locate(txn, key)?.is_some())
    }

    fn locate<'env>(
        &'env self,
        txn: &mut RwTxn<'env>,
        key: &T,
    ) -> Result<Option<NonNull<Node<T>>>, Error> {
        let version = self.observe_version(txn)?;
        let found = self.raw_find(key);
        if found.is_null() {
            self.verify_structure(txn, version);
            return Ok(None);
        }
        let node = unsafe { &*found };
        let item = txn.item(self, found as usize);
        let flags = item.flags();
        if !node.is_valid() && flags & INSERT == 0 {
            return Err(Error::CONFLICT);
        }
        if flags & DELETE != 0 {
            return Ok(None);
        }
        let _ = item.observe(0);
        Ok(NonNull::new(found))
    }

    /// Transactional insert.
    ///
    /// Returns `false` on an equal element already present (when
    /// `DUPLICATES` is off), on a double insert within this transaction,
    /// and on insert over an in-transaction update. An insert over this
    /// transaction's own delete collapses into an in-place update.
    pub fn insert<'env>(&'env self, txn: &mut RwTxn<'env>, value: T) -> Result<bool, Error> {
        match self.raw_insert(value, true) {
            RawInsert::Inserted(node) => {
                self.add_size_delta(txn, 1);
                self.arm_structure_write(txn);
                let _ = txn.item(self, node as usize).add_write(()).add_flags(INSERT);
                Ok(true)
            }
            RawInsert::Found { node, value } => {
                let node_ref = unsafe { &*node };
                let item = txn.item(self, node as usize);
                let flags = item.flags();
                if !node_ref.is_valid() && flags & INSERT == 0 {
                    return Err(Error::CONFLICT);
                }
                if flags & (INSERT | UPDATE) != 0 {
                    return Ok(false);
                }
                if flags & DELETE != 0 {
                    // delete-then-insert: overwrite in place at commit
                    let _ = item.clear_write().add_write(value).assign_flags(UPDATE);
                    self.add_size_delta(txn, 1);
                    return Ok(true);
                }
                // already present; witness it so a concurrent delete conflicts
                let _ = item.observe(0);
                Ok(false)
            }
        }
    }

    /// Transactional remove of the first element equal to `key`.
    pub fn remove<'env>(&'env self, txn: &mut RwTxn<'env>, key: &T) -> Result<bool, Error> {
        let version = self.observe_version(txn)?;
        let found = self.raw_find(key);
        if found.is_null() {
            self.verify_structure(txn, version);
            return Ok(false);
        }
        let node = unsafe { &*found };
        let item = txn.item(self, found as usize);
        let flags = item.flags();
        if !node.is_valid() && flags & INSERT == 0 {
            return Err(Error::CONFLICT);
        }
        if flags & DELETE != 0 {
            return Ok(false);
        }
        if flags & UPDATE != 0 {
            // update was a delete once; back to deleting
            let _ = item.assign_flags(DELETE);
            self.add_size_delta(txn, -1);
            return Ok(true);
        }
        if flags & INSERT != 0 {
            // deleting our own speculative insert: unlink it right away
            let _ = self.raw_remove(found);
            let _ = item.remove_read().clear_write().clear_flags(INSERT);
            self.add_size_delta(txn, -1);
            // someone else may still grow the structure under us
            self.verify_structure(txn, version);
            return Ok(true);
        }
        let _ = item.assign_flags(DELETE).add_write(()).observe(0);
        self.arm_structure_write(txn);
        self.add_size_delta(txn, -1);
        Ok(true)
    }

    /// Transactional element count: the committed count plus this
    /// transaction's own insert/delete delta.
    pub fn len<'env>(&'env self, txn: &mut RwTxn<'env>) -> Result<usize, Error> {
        let version = self.observe_version(txn)?;
        self.verify_structure(txn, version);
        let delta = self.size_delta(txn);
        let count = self.count.load(Relaxed) as isize;
        Ok(count.saturating_add(delta).max(0) as usize)
    }

    pub fn is_empty<'env>(&'env self, txn: &mut RwTxn<'env>) -> Result<bool, Error> {
        Ok(self.len(txn)? == 0)
    }

    /// Begins a transactional iteration.
    ///
    /// Construction registers a size-version observation, so any structural
    /// commit elsewhere aborts this transaction at commit time even if the
    /// iteration itself completed.
    pub fn iter<'env>(
        &'env self,
        txn: &mut RwTxn<'env>,
    ) -> Result<TxIter<'env, T, C, SORTED, DUPLICATES, OPACITY>, Error> {
        let version = self.observe_version(txn)?;
        self.verify_structure(txn, version);
        Ok(TxIter {
            list: self,
            cur:  self.head.load(Acquire),
        })
    }

    /// Unlinks `target` and queues it for deferred reclamation. Used for
    /// speculative nodes and commit-time removals; `count` is the caller's
    /// business.
    fn raw_remove(&self, target: *mut Node<T>) -> bool {
        let _guard = self.structure.lock();
        let mut prev: *mut Node<T> = ptr::null_mut();
        let mut cur = self.head.load(Relaxed);
        while !cur.is_null() {
            let node = unsafe { &*cur };
            if cur == target {
                node.mark_invalid();
                let next = node.next.ptr();
                if prev.is_null() {
                    self.head.store(next, Release);
                } else {
                    unsafe { &*prev }.next.assign_ptr(next);
                }
                unsafe { rcu::delete(cur) };
                return true;
            }
            prev = cur;
            cur = node.next.ptr();
        }
        false
    }

    /// Size-version snapshot at operation start; in opacity mode also an
    /// early consistency check.
    fn observe_version<'env>(&'env self, txn: &RwTxn<'env>) -> Result<u64, Error> {
        let version = self.size_version.observe();
        fence(Acquire);
        if OPACITY {
            txn.check_opacity(version)?;
        }
        Ok(version)
    }

    /// Registers `observed` on the list item: commit aborts if the
    /// size-version has moved since.
    fn verify_structure<'env>(&'env self, txn: &mut RwTxn<'env>, observed: u64) {
        let _ = txn.item(self, LIST_KEY).observe(observed);
        fence(Acquire);
    }

    /// Arms the commit-time size-version lock intent.
    fn arm_structure_write<'env>(&'env self, txn: &mut RwTxn<'env>) {
        let _ = txn.item(self, LIST_KEY).add_write(());
    }

    fn add_size_delta<'env>(&'env self, txn: &mut RwTxn<'env>, delta: isize) {
        let item = txn.item(self, SIZE_KEY);
        let current: isize = item.stash_value(0isize);
        item.set_stash(current + delta);
    }

    fn size_delta<'env>(&'env self, txn: &mut RwTxn<'env>) -> isize {
        txn.item(self, SIZE_KEY).stash_value(0isize)
    }

    fn bump_size_version(&self, txn: &RwTxn<'_>) {
        if OPACITY {
            self.size_version.set(txn.commit_tid());
        } else {
            self.size_version.increment();
        }
    }
}

impl<T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool> Shared
    for TList<T, C, SORTED, DUPLICATES, OPACITY>
where
    T: Send + Sync + 'static,
    C: Compare<T> + Send + Sync,
{
    fn lock(&self, item: &mut Item<'_>, _txn: &RwTxn<'_>) {
        if item.key() == LIST_KEY {
            self.size_version.lock();
        }
    }

    fn check(&self, item: &Item<'_>, _txn: &RwTxn<'_>) -> bool {
        if item.key() == LIST_KEY {
            return self
                .size_version
                .check(item.read_version(), item.needs_unlock());
        }
        let node = unsafe { &*(item.key() as *mut Node<T>) };
        node.is_valid() || item.flags() & INSERT != 0
    }

    fn install(&self, item: &mut Item<'_>, txn: &RwTxn<'_>) {
        if item.key() == LIST_KEY {
            // exists for lock ordering only
            return;
        }
        let target = item.key() as *mut Node<T>;
        let flags = item.flags();
        if flags & DELETE != 0 {
            let _ = self.raw_remove(target);
            let _ = self.count.fetch_sub(1, Relaxed);
            self.bump_size_version(txn);
        } else if flags & UPDATE != 0 {
            if let Some(value) = item.take_write::<T>() {
                unsafe { *(*target).val.get() = value };
            }
            self.bump_size_version(txn);
        } else {
            unsafe { &*target }.mark_valid();
            let _ = self.count.fetch_add(1, Relaxed);
            self.bump_size_version(txn);
        }
    }

    fn unlock(&self, item: &mut Item<'_>) {
        if item.key() == LIST_KEY {
            self.size_version.unlock();
        }
    }

    fn cleanup(&self, item: &mut Item<'_>, committed: bool) {
        // an aborted insert leaves a reserved invalid node behind
        if !committed && item.flags() & INSERT != 0 {
            let _ = self.raw_remove(item.key() as *mut Node<T>);
        }
    }
}

impl<T, C, const S: bool, const D: bool, const O: bool> Drop for TList<T, C, S, D, O> {
    fn drop(&mut self) {
        let mut cur = mem::replace(self.head.get_mut(), ptr::null_mut());
        while !cur.is_null() {
            let next = unsafe { (*cur).next.ptr() };
            drop(unsafe { Box::from_raw(cur) });
            cur = next;
        }
    }
}

/// Non-transactional iterator over visible elements.
pub struct Iter<'a, T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool> {
    cur:     *mut Node<T>,
    _pin:    rcu::Guard,
    _marker: PhantomData<&'a TList<T, C, SORTED, DUPLICATES, OPACITY>>,
}

impl<'a, T, C, const S: bool, const D: bool, const O: bool> Debug for Iter<'a, T, C, S, D, O> {
    #[cold]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad("Iter { .. }")
    }
}

impl<'a, T, C, const S: bool, const D: bool, const O: bool> Iterator for Iter<'a, T, C, S, D, O>
where
    T: Clone,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while !self.cur.is_null() {
            let node = unsafe { &*self.cur };
            self.cur = node.next.ptr();
            if node.is_valid() {
                return Some(unsafe { node.value() }.clone());
            }
        }
        None
    }
}

/// Transactional iterator.
///
/// Forward only, single pass per [`reset`](TxIter::reset). Deletions staged
/// by this transaction are hidden; insertions staged by this transaction are
/// yielded even though their nodes are not yet published; any other
/// transaction's unpublished or tombstoned node aborts, because no
/// consistent iteration exists once a foreign structural change is visible
/// mid-walk.
pub struct TxIter<'env, T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool> {
    list: &'env TList<T, C, SORTED, DUPLICATES, OPACITY>,
    cur:  *mut Node<T>,
}

impl<'env, T, C, const S: bool, const D: bool, const O: bool> Debug for TxIter<'env, T, C, S, D, O> {
    #[cold]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad("TxIter { .. }")
    }
}

impl<'env, T, C, const SORTED: bool, const DUPLICATES: bool, const OPACITY: bool>
    TxIter<'env, T, C, SORTED, DUPLICATES, OPACITY>
where
    T: Send + Sync + 'static,
    C: Compare<T> + Send + Sync,
{
    /// Yields the next visible element, or `Err` when a foreign invalid
    /// node makes consistent iteration impossible.
    pub fn next(&mut self, txn: &mut RwTxn<'env>) -> Result<Option<T>, Error>
    where
        T: Clone,
    {
        loop {
            let cur = self.cur;
            if cur.is_null() {
                return Ok(None);
            }
            let node = unsafe { &*cur };
            let item = txn.check_item(self.list, cur as usize);
            if !node.is_valid() && !item.map_or(false, |item| item.flags() & INSERT != 0) {
                return Err(Error::CONFLICT);
            }
            self.cur = node.next.ptr();
            if item.map_or(false, |item| item.flags() & DELETE != 0) {
                continue;
            }
            return Ok(Some(unsafe { node.value() }.clone()));
        }
    }

    /// Restarts the walk from the head.
    pub fn reset(&mut self) {
        self.cur = self.list.head.load(Acquire);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Bag, SortedList, SortedSet, UnsortedSet};

    fn send_sync<T: Send + Sync>() {}

    #[test]
    fn is_send_sync() {
        send_sync::<SortedSet<u64>>();
        send_sync::<Bag<String>>();
    }

    #[test]
    fn sorted_set_rejects_duplicates() {
        let mut set: SortedSet<u64> = SortedSet::new();
        assert!(set.nontrans_insert(3));
        assert!(set.nontrans_insert(1));
        assert!(!set.nontrans_insert(3));
        assert_eq!(set.nontrans_len(), 2);
        assert_eq!(set.nontrans_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn sorted_list_keeps_equals_in_insertion_order() {
        let mut list: SortedList<(u64, &'static str), FirstField> =
            SortedList::with_compare(FirstField);
        assert!(list.nontrans_insert((2, "a")));
        assert!(list.nontrans_insert((1, "x")));
        assert!(list.nontrans_insert((2, "b")));
        assert!(list.nontrans_insert((2, "c")));
        assert_eq!(
            list.nontrans_iter().collect::<Vec<_>>(),
            vec![(1, "x"), (2, "a"), (2, "b"), (2, "c")]
        );
    }

    #[derive(Clone, Copy, Default)]
    struct FirstField;

    impl Compare<(u64, &'static str)> for FirstField {
        fn compare(&self, a: &(u64, &'static str), b: &(u64, &'static str)) -> core::cmp::Ordering {
            a.0.cmp(&b.0)
        }
    }

    #[test]
    fn bag_prepends() {
        let mut bag: Bag<u64> = Bag::new();
        assert!(bag.nontrans_insert(1));
        assert!(bag.nontrans_insert(2));
        assert!(bag.nontrans_insert(2));
        assert_eq!(bag.nontrans_iter().collect::<Vec<_>>(), vec![2, 2, 1]);
    }

    #[test]
    fn unsorted_set_appends_and_rejects_duplicates() {
        let mut set: UnsortedSet<u64> = UnsortedSet::new();
        assert!(set.nontrans_insert(2));
        assert!(set.nontrans_insert(1));
        assert!(!set.nontrans_insert(2));
        assert_eq!(set.nontrans_iter().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn nontrans_remove_unlinks() {
        let mut set: SortedSet<u64> = SortedSet::new();
        for v in [1, 2, 3] {
            assert!(set.nontrans_insert(v));
        }
        assert!(set.nontrans_remove(&2));
        assert!(!set.nontrans_remove(&2));
        assert_eq!(set.nontrans_len(), 2);
        assert_eq!(set.nontrans_find(&2), None);
        assert_eq!(set.nontrans_find(&3), Some(3));
    }

    #[test]
    fn clear_empties() {
        let mut set: SortedSet<u64> = SortedSet::new();
        for v in 0..10 {
            assert!(set.nontrans_insert(v));
        }
        set.clear();
        assert_eq!(set.nontrans_len(), 0);
        assert_eq!(set.nontrans_iter().count(), 0);
    }
}
