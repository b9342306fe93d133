//! Per-thread pending exception.
//!
//! The accessors signal failure by raising through the host and returning an
//! error sentinel; the raised exception waits here until the caller takes it.
//! Raising while an exception is pending replaces it.

use std::cell::RefCell;
use std::fmt;

use natt_rt::ExcKind;

/// A raised, not yet handled exception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingError {
    pub kind: ExcKind,
    pub message: String,
}

impl fmt::Display for PendingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

thread_local! {
    static PENDING: RefCell<Option<PendingError>> = const { RefCell::new(None) };
}

/// Set the pending exception.
pub fn raise(kind: ExcKind, message: &str) {
    tracing::trace!(%kind, message, "exception raised");
    PENDING.with(|p| {
        *p.borrow_mut() = Some(PendingError {
            kind,
            message: message.to_owned(),
        });
    });
}

/// Whether an exception is pending on this thread.
#[must_use]
pub fn error_occurred() -> bool {
    PENDING.with(|p| p.borrow().is_some())
}

/// Take the pending exception, clearing it.
#[must_use]
pub fn take_error() -> Option<PendingError> {
    PENDING.with(|p| p.borrow_mut().take())
}

/// Clear any pending exception (call before each test).
pub fn reset_error_state() {
    PENDING.with(|p| *p.borrow_mut() = None);
}
