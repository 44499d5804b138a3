//! Re-entrancy guard for the two enumerators of a connector run.

use std::cell::{RefCell, RefMut};

/// Exclusive access to a value that must not be entered twice.
///
/// A completeness check on one side of a connector may advance the other
/// side's enumerator, which may check a group and try to advance the
/// first side again. The second attempt finds the guard held and fails
/// instead of recursing.
#[derive(Debug)]
pub struct ReentrancyGuard<T> {
    inner: RefCell<T>,
}

impl<T> ReentrancyGuard<T> {
    pub fn new(value: T) -> Self {
        Self { inner: RefCell::new(value) }
    }

    /// `None` while the value is already held further up the stack.
    pub fn lock(&self) -> Option<RefMut<'_, T>> {
        self.inner.try_borrow_mut().ok()
    }

    pub fn is_locked(&self) -> bool {
        self.inner.try_borrow_mut().is_err()
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
