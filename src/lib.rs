//! An optimistic software transactional memory runtime for building
//! transactional containers.
//!
//! `optx` is the commit machinery: containers describe their reads, writes,
//! and structural intent through per-transaction [`Item`]s, and the runtime
//! drives the lock → check → install → unlock protocol against each
//! participating container at commit time.
//!
//! # Examples
//!
//! Running a transaction:
//!
//! ```
//! let result: i32 = optx::rw(|_tx| Ok(42));
//! assert_eq!(result, 42);
//! ```
//!
//! Containers opt in by implementing [`Shared`] and registering items on the
//! transaction as their operations run:
//!
//! * [`RwTxn::item`] get-or-creates the item scoped to `(container, key)`.
//! * [`ItemProxy::observe`] arms a versioned read; [`ItemProxy::add_write`]
//!   arms a write with a pending payload.
//! * At commit, the runtime calls the container's [`Shared`] callbacks per
//!   item, in a fixed global order.
//!
//! # Features
//!
//! * Transactions behave as though every participating container were locked
//!   for the duration of the commit, without holding any container lock
//!   while user code runs.
//! * Conflicts surface as [`tx::Error`] and compose with `?`; [`rw`] retries
//!   until a commit succeeds, [`try_rw`] makes a single attempt.
//! * Memory unlinked by a committing transaction is reclaimed through an
//!   epoch-based collector ([`rcu`]), so concurrent readers can keep
//!   traversing raw pointers they already hold.
//!
//! [`Item`]: item/struct.Item.html
//! [`ItemProxy::observe`]: item/struct.ItemProxy.html#method.observe
//! [`ItemProxy::add_write`]: item/struct.ItemProxy.html#method.add_write
//! [`RwTxn::item`]: txn/struct.RwTxn.html#method.item
//! [`Shared`]: shared/trait.Shared.html
//! [`rcu`]: rcu/index.html

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unused_lifetimes)]
#![deny(unused_must_use)]

mod internal;

pub mod item;
pub mod rcu;
pub mod shared;
pub mod stats;
pub mod tx;
pub mod txn;
pub mod version;

pub use item::{Item, ItemProxy};
pub use shared::Shared;
pub use txn::{rw, try_rw, RwTxn};
pub use version::VersionLock;
