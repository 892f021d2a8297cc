//! Lock-free storage cell over a fixed-width integer.
//!
//! This module provides [`AtomicCell`], the primitive every
//! [`NumericValue`](super::NumericValue) points at. It knows nothing about
//! sharing or copy-on-write: it only loads, stores, adds and swaps.

use std::fmt::{self, Debug};

use atomic_traits::{fetch::Add, Atomic};
use crossbeam_utils::CachePadded;

use crate::cells::{Integer, ORDERING};

/// A lock-free mutable cell holding a single `T`.
///
/// The atomic is wrapped in [`CachePadded`] so that cells handed to
/// different threads (a reduction accumulator and a task's private bounds,
/// for instance) never share a cache line.
///
/// All operations are sequentially consistent.
///
/// # Examples
///
/// ```rust
/// use numeri::cells::AtomicCell;
///
/// let cell = AtomicCell::new(40u64);
/// assert_eq!(cell.fetch_add(2), 40);
/// assert_eq!(cell.load(), 42);
///
/// let mut expected = 42;
/// while !cell.compare_and_swap(&mut expected, 7) {}
/// assert_eq!(cell.load(), 7);
/// ```
pub struct AtomicCell<T: Integer> {
    inner: CachePadded<T::Backing>,
}

impl<T: Integer> AtomicCell<T> {
    /// Creates a new cell holding `value`.
    pub fn new(value: T) -> Self {
        AtomicCell {
            inner: CachePadded::new(<T::Backing as Atomic>::new(value)),
        }
    }

    /// Returns the current value.
    #[inline]
    pub fn load(&self) -> T {
        self.inner.load(ORDERING)
    }

    /// Unconditionally replaces the current value.
    #[inline]
    pub fn store(&self, value: T) {
        self.inner.store(value, ORDERING)
    }

    /// Adds `delta` to the current value, returning the previous value.
    ///
    /// Wraps around on overflow.
    #[inline]
    pub fn fetch_add(&self, delta: T) -> T {
        Add::fetch_add(&*self.inner, delta, ORDERING)
    }

    /// Stores `desired` if the current value equals `*expected`.
    ///
    /// Returns `true` on success. On failure the current value is written
    /// into `*expected` and `false` is returned. This is a weak CAS and may
    /// fail spuriously even when the values match, so it must be called in
    /// a loop.
    #[inline]
    pub fn compare_and_swap(&self, expected: &mut T, desired: T) -> bool {
        match self
            .inner
            .compare_exchange_weak(*expected, desired, ORDERING, ORDERING)
        {
            Ok(_) => true,
            Err(actual) => {
                *expected = actual;
                false
            }
        }
    }
}

impl<T: Integer + Default> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Integer> Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCell").field(&self.load()).finish()
    }
}
