//! # Numeri - Copy-on-Write Atomic Numbers
//!
//! A Rust library providing a thread-safe integer with **value semantics**:
//! copies are O(1) and share one atomic cell until one of them is mutated,
//! at which point that copy transparently forks onto storage of its own.
//! On top of it sits a parallel range reducer that sums a numeric range on
//! many threads into a single shared accumulator.
//!
//! ## The Problem
//!
//! Sharing an atomic between logical "copies" of a number is cheap but makes
//! every write visible through every copy. Giving each copy its own atomic
//! is safe but turns every copy into an allocation. Copy-on-write gets both:
//! share while reading, fork on the first write.
//!
//! The difficult part is doing that under concurrency:
//!
//! 1. **Fork exactly once**: two threads mutating the same shared instance
//!    must not both fork, and neither may write to the old cell.
//!
//! 2. **No lost updates**: increments and compound adds on one instance are
//!    CAS loops that retry under contention.
//!
//! 3. **No hidden aliasing**: a post-increment returns a fresh private
//!    snapshot, never a view of the cell it just bumped.
//!
//! ## Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AtomicCell`](cells::AtomicCell) | Cache-padded lock-free integer cell (load, store, fetch-add, weak CAS) |
//! | [`CellFactory`](cells::CellFactory) | Zero-sized creator of fresh cells and private values |
//! | [`NumericValue`](cells::NumericValue) | Copy-on-write number over a shared cell |
//! | [`RangeReducer`](reducers::RangeReducer) | Parallel inclusive-range summation |
//!
//! ## Quick Start
//!
//! ```rust
//! use numeri::cells::CellFactory;
//! use numeri::reducers::RangeReducer;
//!
//! let factory = CellFactory::<u64>::new();
//! let sum = factory.value(0);
//! let lo = factory.value(0);
//! let hi = factory.value(100);
//!
//! RangeReducer::new().reduce(&sum, &lo, &hi, 4).unwrap();
//!
//! // Inclusive bounds: 0 + 1 + ... + 100
//! assert_eq!(sum.value(), 5050);
//! ```
//!
//! ## The Compound Add Hazard
//!
//! [`NumericValue::compound_add`](cells::NumericValue::compound_add) never
//! loses an update to the value being added *into*, but it reads its operand
//! without any lock. If another thread is mutating the operand at the same
//! time, the amount added is whichever value the operand held on the
//! successful CAS attempt. This is a property of the operation, not a bug to
//! be worked around by callers of the reducer: each reduction task only ever
//! adds its own private partial sum.
//!
//! ## Logging
//!
//! Reductions and forks emit [`tracing`] events (`debug` per reduction and
//! per folded partial, `trace` per loop step and per fork). The library
//! never installs a subscriber.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | [`snapshot`] module and serde impls for `NumericValue` |
//! | `full` | All optional library features |
//! | `demo` | Dependencies of the `parallel_sum` demo |

pub mod cells;
pub mod reducers;

#[cfg(feature = "serde")]
pub mod snapshot;
