//! Parallel inclusive-range summation.
//!
//! This module provides [`RangeReducer`], which splits `[lo, hi)` into one
//! contiguous slice per worker, sums each slice on its own thread and folds
//! every partial sum into a single shared accumulator.
//!
//! # Inclusive Bounds
//!
//! The reduction adds `lo + (lo + 1) + ... + hi`: the upper bound is part of
//! the sum. Over `[0, 100)` the result is 5050, not 4950, whatever the
//! worker count.
//!
//! # Partitioning
//!
//! ```text
//!   lo                                                         hi
//!   ├────── width ──────┼────── width ──────┼──── width + rem ────┤
//!   │ slice 0           │ slice 1           │ slice 2 (last)      │
//!   │ [lo, s1 - 1]      │ [s1, s2 - 1]      │ [s2, hi]            │
//! ```
//!
//! `width = (hi - lo) / worker_count`; the last slice absorbs the remainder
//! and is the only one that includes its end.

use std::any::Any;
use std::fmt::{self, Debug};
use std::thread;

use num_traits::NumCast;
use tracing::{debug, trace, warn};

use crate::cells::{CellFactory, Integer, NumericValue};
use crate::reducers::{ReduceError, Result};

/// One contiguous piece of a reduction range, processed by one task.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Slice<T: Integer> {
    /// Position of the slice within the partition.
    pub index: usize,
    /// First value of the slice.
    pub start: T,
    /// End of the slice: exclusive, except for the last slice.
    pub end: T,
    /// Whether this is the last slice, whose `end` is included.
    pub last: bool,
}

impl<T: Integer> Slice<T> {
    /// Returns the inclusive `(lower, upper)` bounds of the slice, or `None`
    /// if it holds no values.
    pub fn bounds(&self) -> Option<(T, T)> {
        if self.last {
            (self.start <= self.end).then_some((self.start, self.end))
        } else if self.start < self.end {
            Some((self.start, self.end - T::one()))
        } else {
            None
        }
    }

    /// Returns `true` if the slice holds no values.
    pub fn is_empty(&self) -> bool {
        self.bounds().is_none()
    }
}

impl<T: Integer> Debug for Slice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.last { ']' } else { ')' };
        write!(f, "#{}[{}, {}{}", self.index, self.start, self.end, close)
    }
}

/// Sums an inclusive numeric range on a fixed number of threads.
///
/// Each task builds its own private [`NumericValue`] bounds and running sum
/// through the reducer's [`CellFactory`], then folds the partial sum into
/// the caller's accumulator with
/// [`compound_add`](NumericValue::compound_add). All tasks borrow the same
/// accumulator instance, so they all add into one cell; the CAS loop in
/// `compound_add` makes those concurrent adds lossless.
///
/// # Examples
///
/// ```rust
/// use numeri::cells::NumericValue;
/// use numeri::reducers::RangeReducer;
///
/// let sum = NumericValue::new(0u64);
/// let lo = NumericValue::new(1u64);
/// let hi = NumericValue::new(10u64);
///
/// RangeReducer::new().reduce(&sum, &lo, &hi, 3).unwrap();
/// assert_eq!(sum.value(), 55);
/// ```
pub struct RangeReducer<T: Integer> {
    name: &'static str,
    factory: CellFactory<T>,
}

impl<T: Integer> RangeReducer<T> {
    /// Creates a new reducer with no name.
    pub const fn new() -> Self {
        RangeReducer {
            name: "",
            factory: CellFactory::new(),
        }
    }

    /// Sets the name of this reducer, returning `self` for method chaining.
    ///
    /// The name tags the tracing span of every reduction and prefixes the
    /// task thread names.
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Returns the name of this reducer.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the factory used for task-local values.
    pub fn factory(&self) -> CellFactory<T> {
        self.factory
    }

    /// Splits `[lo, hi)` into `worker_count` contiguous slices.
    ///
    /// Returns no slices when `lo > hi`.
    ///
    /// # Errors
    ///
    /// [`ReduceError::InvalidWorkerCount`] if `worker_count` is zero or not
    /// representable in `T`, [`ReduceError::RangeTooWide`] if `hi - lo`
    /// overflows `T`.
    pub fn slices(&self, lo: T, hi: T, worker_count: usize) -> Result<Vec<Slice<T>>> {
        let workers: T = match <T as NumCast>::from(worker_count) {
            Some(workers) if worker_count > 0 => workers,
            _ => return Err(ReduceError::InvalidWorkerCount { worker_count }),
        };

        if lo > hi {
            return Ok(Vec::new());
        }

        let span = hi.checked_sub(&lo).ok_or_else(|| ReduceError::RangeTooWide {
            lo: lo.to_string(),
            hi: hi.to_string(),
        })?;
        let width = span / workers;

        let mut slices = Vec::with_capacity(worker_count);
        let mut start = lo;
        for index in 0..worker_count {
            let last = index + 1 == worker_count;
            let end = if last { hi } else { start + width };
            slices.push(Slice {
                index,
                start,
                end,
                last,
            });
            start = end;
        }
        Ok(slices)
    }

    /// Runs the sequential accumulation loop over one slice.
    ///
    /// The running sum starts as a copy of the lower bound; the bound is then
    /// advanced and folded in until it reaches the upper bound. Returns
    /// `None` for an empty slice.
    pub fn accumulate(&self, slice: &Slice<T>) -> Option<NumericValue<T>> {
        let (start, end) = slice.bounds()?;
        let lower = self.factory.value(start);
        let upper = self.factory.value(end);

        let sum = lower.clone();
        while !upper.less_or_equal(&lower) {
            lower.increment_and_get();
            sum.compound_add(&lower);
            trace!(slice = slice.index, lower = %lower, upper = %upper, sum = %sum, "step");
        }
        Some(sum)
    }

    /// Sums `lo.value() ..= hi.value()` on `worker_count` threads and adds
    /// the result to `accumulator`.
    ///
    /// Blocks until every task has finished. A degenerate range
    /// (`lo > hi`) spawns nothing and leaves the accumulator unchanged.
    ///
    /// # Errors
    ///
    /// - [`ReduceError::InvalidWorkerCount`] / [`ReduceError::RangeTooWide`]:
    ///   nothing is spawned and the accumulator is untouched.
    /// - [`ReduceError::Spawn`]: no further tasks are started; those already
    ///   running are joined and may have folded their partial sums.
    /// - [`ReduceError::TaskPanicked`]: the first slice whose task panicked,
    ///   reported after all tasks are joined.
    pub fn reduce(
        &self,
        accumulator: &NumericValue<T>,
        lo: &NumericValue<T>,
        hi: &NumericValue<T>,
        worker_count: usize,
    ) -> Result<()> {
        let span = tracing::debug_span!("reduce", name = self.name, worker_count);
        let _enter = span.enter();

        let (lo, hi) = (lo.value(), hi.value());
        let slices = self.slices(lo, hi, worker_count)?;
        if slices.is_empty() {
            warn!(lo = %lo, hi = %hi, "degenerate range, accumulator left unchanged");
            return Ok(());
        }

        debug!(lo = %lo, hi = %hi, slices = slices.len(), "starting reduction");
        self.fan_out(&slices, accumulator, &span, |slice| self.accumulate(slice))
    }

    /// Spawns one thread per slice running `task`, folds every partial it
    /// returns into `accumulator` and joins them all.
    fn fan_out<F>(
        &self,
        slices: &[Slice<T>],
        accumulator: &NumericValue<T>,
        span: &tracing::Span,
        task: F,
    ) -> Result<()>
    where
        F: Fn(&Slice<T>) -> Option<NumericValue<T>> + Sync,
    {
        let prefix = if self.name.is_empty() {
            "reduce"
        } else {
            self.name
        };
        let task = &task;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(slices.len());
            let mut failure = None;

            for slice in slices {
                let span = span.clone();
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", prefix, slice.index))
                    .spawn_scoped(scope, move || {
                        let _enter = span.enter();
                        match task(slice) {
                            Some(partial) => {
                                accumulator.compound_add(&partial);
                                debug!(slice = ?slice, partial = %partial, "folded partial sum");
                            }
                            None => trace!(slice = ?slice, "empty slice"),
                        }
                    });

                match spawned {
                    Ok(handle) => handles.push((slice.index, handle)),
                    Err(source) => {
                        warn!(slice = slice.index, error = %source, "failed to spawn task");
                        failure = Some(ReduceError::Spawn {
                            slice: slice.index,
                            source,
                        });
                        break;
                    }
                }
            }

            for (index, handle) in handles {
                if let Err(payload) = handle.join() {
                    let message = panic_message(&*payload);
                    warn!(slice = index, message = %message, "task panicked");
                    failure.get_or_insert(ReduceError::TaskPanicked {
                        slice: index,
                        message,
                    });
                }
            }

            match failure {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

impl<T: Integer> Default for RangeReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Integer> Debug for RangeReducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeReducer")
            .field("name", &self.name)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(lo: u64, hi: u64, worker_count: usize) -> Result<u64> {
        let factory = CellFactory::<u64>::new();
        let sum = factory.value(0);
        RangeReducer::new().reduce(&sum, &factory.value(lo), &factory.value(hi), worker_count)?;
        Ok(sum.value())
    }

    fn sequential_total<T: Integer>(reducer: &RangeReducer<T>, slices: &[Slice<T>]) -> T {
        slices
            .iter()
            .filter_map(|slice| reducer.accumulate(slice))
            .fold(T::zero(), |acc, partial| acc + partial.value())
    }

    #[test]
    fn test_single_worker_is_inclusive() {
        assert_eq!(run(0, 100, 1).unwrap(), 5050);
    }

    #[test]
    fn test_worker_counts_agree() {
        for workers in [1, 2, 3, 4, 7, 8, 16] {
            assert_eq!(run(0, 100, workers).unwrap(), 5050, "workers={}", workers);
        }
    }

    #[test]
    fn test_slices_tile_range() {
        let reducer = RangeReducer::<u64>::new();
        for workers in [1, 2, 4, 7] {
            let slices = reducer.slices(0, 100, workers).unwrap();
            assert_eq!(slices.len(), workers);
            assert_eq!(slices[0].start, 0);
            assert_eq!(slices[workers - 1].end, 100);
            assert!(slices[workers - 1].last);
            for pair in slices.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
                assert!(!pair[0].last);
            }
            assert_eq!(sequential_total(&reducer, &slices), 5050, "workers={}", workers);
        }
    }

    #[test]
    fn test_last_slice_absorbs_remainder() {
        let reducer = RangeReducer::<u32>::new();
        let slices = reducer.slices(0, 100, 7).unwrap();
        assert_eq!(slices[0].bounds(), Some((0, 13)));
        assert_eq!(slices[5].bounds(), Some((70, 83)));
        assert_eq!(slices[6].bounds(), Some((84, 100)));
    }

    #[test]
    fn test_slices_offset_range() {
        let reducer = RangeReducer::<i32>::new();
        let slices = reducer.slices(-10, 10, 2).unwrap();
        assert_eq!(slices[0].bounds(), Some((-10, -1)));
        assert_eq!(slices[1].bounds(), Some((0, 10)));
        assert_eq!(sequential_total(&reducer, &slices), 0);
    }

    #[test]
    fn test_more_workers_than_values() {
        let reducer = RangeReducer::<u64>::new();
        let slices = reducer.slices(0, 3, 7).unwrap();
        assert!(slices[..6].iter().all(Slice::is_empty));
        assert_eq!(slices[6].bounds(), Some((0, 3)));
        assert_eq!(run(0, 3, 7).unwrap(), 6);
    }

    #[test]
    fn test_accumulate_single_value() {
        let reducer = RangeReducer::<u64>::new();
        let slice = Slice {
            index: 0,
            start: 42,
            end: 42,
            last: true,
        };
        assert_eq!(reducer.accumulate(&slice).unwrap().value(), 42);
        assert_eq!(run(42, 42, 3).unwrap(), 42);
    }

    #[test]
    fn test_accumulate_empty_slice() {
        let reducer = RangeReducer::<u64>::new();
        let slice = Slice {
            index: 0,
            start: 0,
            end: 0,
            last: false,
        };
        assert!(slice.is_empty());
        assert!(reducer.accumulate(&slice).is_none());
    }

    #[test]
    fn test_accumulate_up_to_max_terminates() {
        let reducer = RangeReducer::<u8>::new();
        let slice = Slice {
            index: 0,
            start: 250,
            end: u8::MAX,
            last: true,
        };
        // 250 + 251 + ... + 255 = 1515, wrapped into u8.
        assert_eq!(reducer.accumulate(&slice).unwrap().value(), (1515u32 % 256) as u8);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let factory = CellFactory::<u64>::new();
        let sum = factory.value(17);
        let err = RangeReducer::new()
            .reduce(&sum, &factory.value(0), &factory.value(100), 0)
            .unwrap_err();
        assert!(matches!(err, ReduceError::InvalidWorkerCount { worker_count: 0 }));
        assert_eq!(sum.value(), 17);
    }

    #[test]
    fn test_worker_count_beyond_type_rejected() {
        let factory = CellFactory::<u8>::new();
        let sum = factory.value(0);
        let err = RangeReducer::new()
            .reduce(&sum, &factory.value(0), &factory.value(10), 300)
            .unwrap_err();
        assert!(matches!(err, ReduceError::InvalidWorkerCount { worker_count: 300 }));
        assert_eq!(sum.value(), 0);
    }

    #[test]
    fn test_range_too_wide() {
        let reducer = RangeReducer::<i8>::new();
        let err = reducer.slices(i8::MIN, i8::MAX, 2).unwrap_err();
        assert!(matches!(err, ReduceError::RangeTooWide { .. }));
    }

    #[test]
    fn test_degenerate_range_leaves_accumulator() {
        let factory = CellFactory::<i64>::new();
        for workers in [1, 2, 4, 7] {
            let sum = factory.value(-5);
            RangeReducer::new()
                .reduce(&sum, &factory.value(10), &factory.value(3), workers)
                .unwrap();
            assert_eq!(sum.value(), -5);
        }
    }

    #[test]
    fn test_reduce_adds_to_existing_accumulator() {
        let factory = CellFactory::<u64>::new();
        let sum = factory.value(1000);
        RangeReducer::new()
            .reduce(&sum, &factory.value(0), &factory.value(100), 4)
            .unwrap();
        assert_eq!(sum.value(), 6050);
    }

    #[test]
    fn test_reduce_into_shared_accumulator_forks_it() {
        let factory = CellFactory::<u64>::new();
        let sum = factory.value(0);
        let before = sum.clone();
        RangeReducer::new()
            .reduce(&sum, &factory.value(0), &factory.value(100), 4)
            .unwrap();
        assert_eq!(sum.value(), 5050);
        assert_eq!(before.value(), 0);
    }

    #[test]
    fn test_reduce_leaves_bounds_untouched() {
        let factory = CellFactory::<u64>::new();
        let sum = factory.value(0);
        let lo = factory.value(0);
        let hi = factory.value(100);
        RangeReducer::new().reduce(&sum, &lo, &hi, 4).unwrap();
        assert_eq!(lo.value(), 0);
        assert_eq!(hi.value(), 100);
    }

    #[test]
    fn test_reduce_signed() {
        let factory = CellFactory::<i32>::new();
        let sum = factory.value(0);
        RangeReducer::new()
            .reduce(&sum, &factory.value(-50), &factory.value(-1), 3)
            .unwrap();
        assert_eq!(sum.value(), -1275);
    }

    #[test]
    fn test_task_panic_is_reported_after_join() {
        let reducer = RangeReducer::<u64>::new().with_name("faulty");
        let slices = reducer.slices(0, 100, 4).unwrap();
        let accumulator = NumericValue::new(0u64);

        let result = reducer.fan_out(&slices, &accumulator, &tracing::Span::none(), |slice| {
            if slice.index == 2 {
                panic!("slice two failed");
            }
            reducer.accumulate(slice)
        });

        match result {
            Err(ReduceError::TaskPanicked { slice, message }) => {
                assert_eq!(slice, 2);
                assert_eq!(message, "slice two failed");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // The other three tasks ran to completion.
        let expected: u64 = slices
            .iter()
            .filter(|slice| slice.index != 2)
            .filter_map(|slice| reducer.accumulate(slice))
            .map(|partial| partial.value())
            .sum();
        assert_eq!(accumulator.value(), expected);
    }

    #[test]
    fn test_with_name() {
        let reducer = RangeReducer::<u32>::new().with_name("gauss");
        assert_eq!(reducer.name(), "gauss");
        assert_eq!(format!("{:?}", reducer), "RangeReducer { name: \"gauss\" }");
    }

    #[test]
    fn test_slice_debug() {
        let reducer = RangeReducer::<u32>::new();
        let slices = reducer.slices(0, 10, 2).unwrap();
        assert_eq!(format!("{:?}", slices[0]), "#0[0, 5)");
        assert_eq!(format!("{:?}", slices[1]), "#1[5, 10]");
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u32), "non-string panic payload");
    }

    proptest! {
        #[test]
        fn prop_partition_matches_closed_form(
            lo in 0u64..5_000,
            len in 0u64..5_000,
            workers in 1usize..32,
        ) {
            let hi = lo + len;
            let expected = (lo + hi) * (hi - lo + 1) / 2;

            let reducer = RangeReducer::<u64>::new();
            let slices = reducer.slices(lo, hi, workers).unwrap();
            prop_assert_eq!(sequential_total(&reducer, &slices), expected);
        }
    }
}
