//! Copy-on-write numeric value backed by a shared atomic cell.
//!
//! This module provides [`NumericValue`], a number with value semantics whose
//! copies share one [`AtomicCell`] until one of them is mutated.

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::ops::AddAssign;
use std::ptr;
use std::sync::Arc;

use crossbeam_utils::Backoff;
use parking_lot::{
    RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard,
};

use crate::cells::{AtomicCell, CellFactory, Integer};

/// The cell an instance points at, and whether other instances may point at
/// it too. Both fields only ever change together, under the write lock.
struct Storage<T: Integer> {
    cell: Arc<AtomicCell<T>>,
    shared: bool,
}

impl<T: Integer> Storage<T> {
    /// Moves this instance onto a private cell seeded with the current value.
    fn fork(&mut self, factory: &CellFactory<T>) {
        // Last holder: the cell is already private.
        if Arc::get_mut(&mut self.cell).is_some() {
            tracing::trace!("reclaiming cell with no other holders");
            self.shared = false;
            return;
        }

        let seed = self.cell.load();
        tracing::trace!(seed = %seed, "forking shared cell");
        self.cell = factory.create_shared(seed);
        self.shared = false;
    }
}

/// A thread-safe integer with copy-on-write value semantics.
///
/// Cloning is O(1): the clone and the source point at the same
/// [`AtomicCell`] and are both flagged as shared. The first mutating call
/// (`increment_*`, [`compound_add`](Self::compound_add),
/// [`assign`](Self::assign), [`store`](Self::store)) on a shared instance
/// forks it onto a private cell seeded with its current value, so mutations
/// are never visible through other copies.
///
/// Every operation takes `&self`. One instance can be handed by reference
/// to many threads and mutated concurrently; those mutations are atomic and
/// the fork happens exactly once.
///
/// # Compound add hazard
///
/// [`compound_add`](Self::compound_add) re-reads its operand on every CAS
/// retry. If the operand is being mutated by another thread at the same
/// time, the amount added is *some* value the operand held during the call,
/// not necessarily the one it held when the call started.
///
/// # Examples
///
/// ```rust
/// use numeri::cells::NumericValue;
///
/// let a = NumericValue::new(10u64);
/// let b = a.clone();
/// assert!(a.shares_storage_with(&b));
///
/// b.increment_and_get();
/// assert_eq!(a.value(), 10);
/// assert_eq!(b.value(), 11);
/// assert!(!a.shares_storage_with(&b));
/// ```
///
/// Concurrent increments on one instance never lose updates:
///
/// ```rust
/// use numeri::cells::NumericValue;
/// use std::thread;
///
/// let counter = NumericValue::new(0u64);
/// thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             for _ in 0..1000 {
///                 counter.increment_and_get();
///             }
///         });
///     }
/// });
/// assert_eq!(counter.value(), 4000);
/// ```
pub struct NumericValue<T: Integer> {
    storage: RwLock<Storage<T>>,
    factory: CellFactory<T>,
}

impl<T: Integer> NumericValue<T> {
    /// Creates a private value holding `seed`.
    pub fn new(seed: T) -> Self {
        Self::with_factory(CellFactory::new(), seed)
    }

    pub(crate) fn with_factory(factory: CellFactory<T>, seed: T) -> Self {
        NumericValue {
            storage: RwLock::new(Storage {
                cell: factory.create_shared(seed),
                shared: false,
            }),
            factory,
        }
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> T {
        self.storage.read_recursive().cell.load()
    }

    /// Returns `true` if another instance may still point at this
    /// instance's cell.
    pub fn is_shared(&self) -> bool {
        self.storage.read_recursive().shared
    }

    /// Returns `true` if both instances currently point at the same cell.
    pub fn shares_storage_with(&self, other: &NumericValue<T>) -> bool {
        let mine = Arc::clone(&self.storage.read_recursive().cell);
        let theirs = Arc::clone(&other.storage.read_recursive().cell);
        Arc::ptr_eq(&mine, &theirs)
    }

    /// Returns a read guard on storage this instance owns exclusively,
    /// forking first if the storage is shared.
    ///
    /// Holding the guard keeps `clone` out, so nothing can start sharing the
    /// cell while a mutation is in flight.
    fn owned(&self) -> RwLockReadGuard<'_, Storage<T>> {
        let storage = self.storage.read();
        if !storage.shared {
            return storage;
        }
        drop(storage);

        let storage = self.storage.upgradable_read();
        if !storage.shared {
            // Another thread forked in between.
            return RwLockUpgradableReadGuard::downgrade(storage);
        }

        let mut storage = RwLockUpgradableReadGuard::upgrade(storage);
        storage.fork(&self.factory);
        RwLockWriteGuard::downgrade(storage)
    }

    /// Unconditionally replaces the value, forking first if shared.
    pub fn store(&self, value: T) {
        self.owned().cell.store(value);
    }

    /// Adds one and returns the new value (`++x`).
    ///
    /// Wraps around on overflow.
    pub fn increment_and_get(&self) -> T {
        let previous = self.owned().cell.fetch_add(T::one());
        previous.wrapping_add(&T::one())
    }

    /// Adds one and returns a private snapshot of the previous value (`x++`).
    ///
    /// The returned value owns a fresh cell: it never aliases the cell that
    /// was just incremented.
    pub fn increment_and_return_previous(&self) -> NumericValue<T> {
        let previous = {
            let storage = self.owned();
            let backoff = Backoff::new();
            let mut current = storage.cell.load();
            loop {
                let next = current.wrapping_add(&T::one());
                if storage.cell.compare_and_swap(&mut current, next) {
                    break current;
                }
                backoff.spin();
            }
        };
        self.factory.value(previous)
    }

    /// Stores the current value of `other` into this instance.
    ///
    /// This copies the number, not the storage: afterwards the two instances
    /// are still independent.
    pub fn assign(&self, other: &NumericValue<T>) {
        if ptr::eq(self, other) {
            return;
        }
        let storage = self.owned();
        storage.cell.store(other.value());
    }

    /// Adds the value of `other` to this instance (`x += y`).
    ///
    /// Runs a CAS loop that re-reads both operands on every retry. The sum
    /// into this instance is never lost, but if `other` is being mutated
    /// concurrently the amount added is whatever `other` held on the
    /// successful attempt. Wraps around on overflow.
    pub fn compound_add(&self, other: &NumericValue<T>) {
        let storage = self.owned();
        let backoff = Backoff::new();
        let mut current = storage.cell.load();
        loop {
            let sum = current.wrapping_add(&other.value());
            if storage.cell.compare_and_swap(&mut current, sum) {
                return;
            }
            backoff.spin();
        }
    }

    /// Returns `self.value() <= other.value()`.
    ///
    /// The two loads are independent, not a single atomic comparison.
    #[inline]
    pub fn less_or_equal(&self, other: &NumericValue<T>) -> bool {
        self.value() <= other.value()
    }
}

impl<T: Integer> Clone for NumericValue<T> {
    /// Shares the cell with `self`, flagging both instances as shared.
    fn clone(&self) -> Self {
        let mut storage = self.storage.write();
        storage.shared = true;
        NumericValue {
            storage: RwLock::new(Storage {
                cell: Arc::clone(&storage.cell),
                shared: true,
            }),
            factory: self.factory,
        }
    }

    /// Drops the current cell and shares `source`'s instead.
    fn clone_from(&mut self, source: &Self) {
        let cell = {
            let mut storage = source.storage.write();
            storage.shared = true;
            Arc::clone(&storage.cell)
        };
        let storage = self.storage.get_mut();
        storage.cell = cell;
        storage.shared = true;
    }
}

impl<T: Integer> AddAssign<&NumericValue<T>> for NumericValue<T> {
    fn add_assign(&mut self, rhs: &NumericValue<T>) {
        self.compound_add(rhs);
    }
}

impl<T: Integer> PartialEq for NumericValue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl<T: Integer> PartialOrd for NumericValue<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.value().cmp(&other.value()))
    }

    fn le(&self, other: &Self) -> bool {
        self.less_or_equal(other)
    }
}

impl<T: Integer> From<T> for NumericValue<T> {
    fn from(seed: T) -> Self {
        Self::new(seed)
    }
}

impl<T: Integer> Default for NumericValue<T> {
    fn default() -> Self {
        Self::new(T::zero())
    }
}

impl<T: Integer> Display for NumericValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl<T: Integer> Debug for NumericValue<T> {
    /// Output format: `value` or `value (shared)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (value, shared) = {
            let storage = self.storage.read_recursive();
            (storage.cell.load(), storage.shared)
        };
        if shared {
            write!(f, "{:?} (shared)", value)
        } else {
            write!(f, "{:?}", value)
        }
    }
}
