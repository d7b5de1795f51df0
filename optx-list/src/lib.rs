//! A transactional singly-linked list built on the [`optx`] runtime.
//!
//! [`TList`] stores elements of a caller-chosen type and supports lookup,
//! insert, remove, iteration, and size queries — speculatively inside a
//! transaction, or immediately through the `nontrans_*` surface.
//!
//! Ordering, duplicate admission, and opacity are fixed per instance at the
//! type level; [`SortedSet`], [`SortedList`], [`UnsortedSet`], and [`Bag`]
//! name the common shapes.
//!
//! # Examples
//!
//! ```
//! use optx_list::SortedSet;
//!
//! let set: SortedSet<u64> = SortedSet::new();
//!
//! let inserted = set.atomic(|tx| set.insert(tx, 42));
//! assert!(inserted);
//!
//! let present = set.atomic(|tx| set.contains(tx, &42));
//! assert!(present);
//!
//! // Within one transaction, operations compose: deleting and reinserting
//! // an element collapses into an in-place update.
//! set.atomic(|tx| {
//!     assert!(set.remove(tx, &42)?);
//!     assert!(set.insert(tx, 42)?);
//!     assert_eq!(set.find(tx, &42)?, Some(42));
//!     Ok(())
//! });
//! assert_eq!(set.nontrans_find(&42), Some(42));
//! ```
//!
//! # Conflicts
//!
//! Every operation witnesses what it relied on: a found element's presence,
//! or — for misses, sizes, and iterations — the whole structure through the
//! list's size-version. Transactions whose witnesses are invalidated by a
//! concurrent commit abort and, under [`TList::atomic`] or [`optx::rw`],
//! retry.

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unused_lifetimes)]
#![deny(unused_must_use)]

use core::cmp::Ordering;

mod base;
mod spin;

pub use base::{Iter, TList, TxIter};
pub use optx::tx::Error;

/// A pluggable total order over element values.
///
/// Unsorted lists use the comparator for equality detection only.
pub trait Compare<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The default comparator, derived from `Ord`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OrdCompare;

impl<T: Ord> Compare<T> for OrdCompare {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Sorted, duplicates rejected.
pub type SortedSet<T, C = OrdCompare> = TList<T, C, true, false, false>;

/// Sorted, duplicates admitted; equal elements keep insertion order.
pub type SortedList<T, C = OrdCompare> = TList<T, C, true, true, false>;

/// Unsorted, duplicates rejected; new elements append.
pub type UnsortedSet<T, C = OrdCompare> = TList<T, C, false, false, false>;

/// Unsorted, duplicates admitted; new elements prepend in O(1).
pub type Bag<T, C = OrdCompare> = TList<T, C, false, true, false>;
