//! Stateless creator of fresh atomic cells.

use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cells::{AtomicCell, Integer, NumericValue};

/// Creates independent [`AtomicCell`]s and private [`NumericValue`]s.
///
/// The factory is a zero-sized `Copy` value. Every [`NumericValue`] carries
/// one so it can fork without reaching back to whoever created it, and a
/// [`RangeReducer`](crate::reducers::RangeReducer) uses one to build the
/// task-local bounds and partial sums.
///
/// # Examples
///
/// ```rust
/// use numeri::cells::CellFactory;
///
/// let factory = CellFactory::<u64>::new();
/// let cell = factory.create(5);
/// assert_eq!(cell.load(), 5);
///
/// let sum = factory.value(0);
/// assert_eq!(sum.value(), 0);
/// assert!(!sum.is_shared());
/// ```
pub struct CellFactory<T: Integer> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Integer> CellFactory<T> {
    /// Creates a new factory.
    pub const fn new() -> Self {
        CellFactory {
            _marker: PhantomData,
        }
    }

    /// Allocates a new cell initialized to `seed`.
    #[inline]
    pub fn create(&self, seed: T) -> AtomicCell<T> {
        AtomicCell::new(seed)
    }

    /// Allocates a new reference-counted cell initialized to `seed`.
    #[inline]
    pub(crate) fn create_shared(&self, seed: T) -> Arc<AtomicCell<T>> {
        Arc::new(self.create(seed))
    }

    /// Creates a private [`NumericValue`] seeded with `seed`.
    #[inline]
    pub fn value(&self, seed: T) -> NumericValue<T> {
        NumericValue::with_factory(*self, seed)
    }
}

impl<T: Integer> Clone for CellFactory<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Integer> Copy for CellFactory<T> {}

impl<T: Integer> Default for CellFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Integer> Debug for CellFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellFactory<{}>", std::any::type_name::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create() {
        let factory = CellFactory::<i32>::new();
        let cell = factory.create(-3);
        assert_eq!(cell.load(), -3);
    }

    #[test]
    fn test_create_is_independent() {
        let factory = CellFactory::<u32>::new();
        let a = factory.create(1);
        let b = factory.create(1);
        a.fetch_add(10);
        assert_eq!(a.load(), 11);
        assert_eq!(b.load(), 1);
    }

    #[test]
    fn test_value_is_private() {
        let factory = CellFactory::<u64>::new();
        let value = factory.value(9);
        assert_eq!(value.value(), 9);
        assert!(!value.is_shared());
    }

    #[test]
    fn test_zero_sized() {
        assert_eq!(std::mem::size_of::<CellFactory<u64>>(), 0);
    }

    #[test]
    fn test_debug() {
        let factory = CellFactory::<u8>::default();
        assert_eq!(format!("{:?}", factory), "CellFactory<u8>");
    }
}
