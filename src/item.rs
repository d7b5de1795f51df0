//! Per-transaction bookkeeping records.
//!
//! An [`Item`] is created lazily the first time a transaction touches a
//! `(container, key)` pair and lives until the transaction ends. It carries
//! the read/write marks the commit driver dispatches on, a user flag nibble
//! for container-defined intent (insert/delete/update bits and the like), a
//! single versioned read observation, and two type-erased payload slots: the
//! pending write value and a per-transaction stash.

use crate::{shared::Shared, txn::RwTxn};
use core::{
    any::Any,
    fmt::{self, Debug, Formatter},
};

pub(crate) const READ_BIT: u8 = 1 << 0;
pub(crate) const WRITE_BIT: u8 = 1 << 1;
pub(crate) const LOCKED_BIT: u8 = 1 << 2;
const USER_MASK: u8 = 0xf0;

pub struct Item<'env> {
    owner:        &'env (dyn Shared + 'env),
    key:          usize,
    flags:        u8,
    read_version: u64,
    write:        Option<Box<dyn Any + Send>>,
    stash:        Option<Box<dyn Any + Send>>,
}

impl<'env> Debug for Item<'env> {
    #[cold]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("key", &self.key)
            .field("flags", &self.flags)
            .finish()
    }
}

impl<'env> Item<'env> {
    /// First container-defined flag bit; further bits are `USER0 << 1`,
    /// `USER0 << 2`, `USER0 << 3`.
    pub const USER0: u8 = 1 << 4;

    #[inline]
    pub(crate) fn new(owner: &'env (dyn Shared + 'env), key: usize) -> Self {
        Item {
            owner,
            key,
            flags: 0,
            read_version: 0,
            write: None,
            stash: None,
        }
    }

    #[inline]
    pub(crate) fn owner(&self) -> &'env (dyn Shared + 'env) {
        self.owner
    }

    /// Address of the owning container, used for the global commit order.
    #[inline]
    pub(crate) fn owner_addr(&self) -> usize {
        self.owner as *const _ as *const () as usize
    }

    /// The container-chosen key this item is scoped to.
    #[inline]
    pub fn key(&self) -> usize {
        self.key
    }

    /// The raw flag byte. Container bits start at [`Item::USER0`].
    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    #[inline]
    pub fn has_read(&self) -> bool {
        self.flags & READ_BIT != 0
    }

    #[inline]
    pub fn has_write(&self) -> bool {
        self.flags & WRITE_BIT != 0
    }

    /// Whether the committing transaction holds this item's lock; valid
    /// during the `check`..`unlock` callbacks.
    #[inline]
    pub fn needs_unlock(&self) -> bool {
        self.flags & LOCKED_BIT != 0
    }

    #[inline]
    pub(crate) fn set_locked(&mut self) {
        self.flags |= LOCKED_BIT;
    }

    /// The version recorded by the first [`ItemProxy::observe`] call.
    #[inline]
    pub fn read_version(&self) -> u64 {
        self.read_version
    }

    /// Takes the pending write payload, downcast to `V`.
    ///
    /// Returns `None` when no write is pending or the payload is of a
    /// different type (write marks armed with a unit payload).
    #[inline]
    pub fn take_write<V: Any>(&mut self) -> Option<V> {
        self.write
            .take()
            .and_then(|boxed| boxed.downcast::<V>().ok())
            .map(|boxed| *boxed)
    }

    /// Reads the stash slot, or `default` when empty.
    #[inline]
    pub fn stash_value<V: Any + Copy>(&self, default: V) -> V {
        self.stash
            .as_ref()
            .and_then(|boxed| boxed.downcast_ref::<V>())
            .copied()
            .unwrap_or(default)
    }

    #[inline]
    fn set_stash<V: Any + Send>(&mut self, value: V) {
        self.stash = Some(Box::new(value));
    }
}

/// In-transaction handle to an [`Item`].
///
/// Mutators consume and return the proxy so call sites can chain them the
/// way container code reads: `item.clear_write().add_write(v)`.
pub struct ItemProxy<'a, 'env> {
    txn:   &'a mut RwTxn<'env>,
    index: usize,
}

impl<'a, 'env> Debug for ItemProxy<'a, 'env> {
    #[cold]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.get().fmt(f)
    }
}

impl<'a, 'env> ItemProxy<'a, 'env> {
    #[inline]
    pub(crate) fn new(txn: &'a mut RwTxn<'env>, index: usize) -> Self {
        ItemProxy { txn, index }
    }

    #[inline]
    fn get(&self) -> &Item<'env> {
        &self.txn.items[self.index]
    }

    #[inline]
    fn get_mut(&mut self) -> &mut Item<'env> {
        &mut self.txn.items[self.index]
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.get().flags
    }

    #[inline]
    pub fn has_read(&self) -> bool {
        self.get().has_read()
    }

    #[inline]
    pub fn has_write(&self) -> bool {
        self.get().has_write()
    }

    /// Arms a read with a version observation. The first observation wins;
    /// later calls keep the original witness.
    #[inline]
    pub fn observe(mut self, version: u64) -> Self {
        let item = self.get_mut();
        if !item.has_read() {
            item.read_version = version;
            item.flags |= READ_BIT;
        }
        self
    }

    #[inline]
    pub fn remove_read(mut self) -> Self {
        self.get_mut().flags &= !READ_BIT;
        self
    }

    /// Arms a write with a pending payload. Writes without a meaningful
    /// payload pass `()`.
    #[inline]
    pub fn add_write<V: Any + Send>(mut self, value: V) -> Self {
        let item = self.get_mut();
        item.write = Some(Box::new(value));
        item.flags |= WRITE_BIT;
        self
    }

    #[inline]
    pub fn clear_write(mut self) -> Self {
        let item = self.get_mut();
        item.write = None;
        item.flags &= !WRITE_BIT;
        self
    }

    #[inline]
    pub fn add_flags(mut self, flags: u8) -> Self {
        debug_assert_eq!(flags & !USER_MASK, 0, "flag outside the user nibble");
        self.get_mut().flags |= flags;
        self
    }

    /// Replaces the whole user nibble with `flags`.
    #[inline]
    pub fn assign_flags(mut self, flags: u8) -> Self {
        debug_assert_eq!(flags & !USER_MASK, 0, "flag outside the user nibble");
        let item = self.get_mut();
        item.flags = (item.flags & !USER_MASK) | flags;
        self
    }

    #[inline]
    pub fn clear_flags(mut self, flags: u8) -> Self {
        debug_assert_eq!(flags & !USER_MASK, 0, "flag outside the user nibble");
        self.get_mut().flags &= !flags;
        self
    }

    #[inline]
    pub fn stash_value<V: Any + Copy>(&self, default: V) -> V {
        self.get().stash_value(default)
    }

    #[inline]
    pub fn set_stash<V: Any + Send>(mut self, value: V) {
        self.get_mut().set_stash(value)
    }
}
