//! Functionality for working with transactions.

use core::fmt::{self, Debug, Formatter};

#[derive(PartialEq, Eq)]
enum ErrorKind {
    Conflict,
}

/// Error type indicating that the transaction has failed.
///
/// It is typical to route this error back to [`rw`] with `?`, where the
/// transaction will be retried; [`try_rw`] surfaces it to the caller
/// instead.
///
/// [`rw`]: ../fn.rw.html
/// [`try_rw`]: ../fn.try_rw.html
#[derive(PartialEq, Eq)]
pub struct Error {
    kind:     ErrorKind,
    _private: (),
}

impl Debug for Error {
    #[cold]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.pad("Error { .. }")
    }
}

impl Error {
    /// Error value signalling that the current transaction cannot commit.
    ///
    /// Containers return this when an optimistic read has been invalidated
    /// mid-transaction; it is also the value behind the explicit abort
    /// channel — `return Err(Error::CONFLICT)` from anywhere inside a
    /// transaction closure.
    pub const CONFLICT: Self = Error {
        kind:     ErrorKind::Conflict,
        _private: (),
    };
}
