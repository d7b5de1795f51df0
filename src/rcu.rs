//! Deferred reclamation for container memory.
//!
//! Committed removals unlink nodes that concurrent transactions may still be
//! traversing through raw pointers, so nothing is freed inline. Instead the
//! node is handed to an epoch-based collector and dropped once every reader
//! pinned at the time of removal has moved on.
//!
//! Transactions pin the epoch for their whole lifetime; non-transactional
//! read paths pin around each traversal via [`pin`].

pub use crossbeam_epoch::{pin, Guard};

/// Queues `ptr` for reclamation once no pinned reader can observe it.
///
/// # Safety
///
/// `ptr` must have been allocated via `Box::new`, must be unreachable to any
/// reader that pins after this call, and must not be queued twice or freed
/// through other means.
pub unsafe fn delete<T: Send + 'static>(ptr: *mut T) {
    let guard = pin();
    guard.defer_unchecked(move || drop(Box::from_raw(ptr)));
}
