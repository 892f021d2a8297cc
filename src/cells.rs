//! Core module containing the atomic cell, its factory and the copy-on-write
//! numeric value built on top of them.
//!
//! # Architecture
//!
//! ```text
//!   NumericValue<T> ──┐                    ┌──────────────────────────┐
//!   (is_shared=true)  ├── Arc<AtomicCell> ─►│ AtomicCell<T> (padded)   │
//!   NumericValue<T> ──┘                    └──────────────────────────┘
//!   (is_shared=true)
//!          │
//!          │ first mutation forks
//!          ▼
//!   NumericValue<T> ───── Arc<AtomicCell> ─► fresh AtomicCell<T>
//!   (is_shared=false)                        (seeded with the current value)
//! ```
//!
//! Cloning a [`NumericValue`] is O(1): both instances point at the same
//! [`AtomicCell`] and are flagged as shared. The first mutating operation on
//! a shared instance asks the [`CellFactory`] for a new cell seeded with the
//! current value, swaps it in and clears the flag, all under the instance's
//! own lock. Mutations on a private instance go straight to the atomic cell
//! and never block each other.
//!
//! # Memory Ordering
//!
//! Every cell operation uses `Ordering::SeqCst`: all threads observe the
//! operations on one cell in a single global order. Nothing is promised
//! across different cells.

pub mod atomic;
pub mod factory;
pub mod value;

pub use atomic::AtomicCell;
pub use factory::CellFactory;
pub use value::NumericValue;

use atomic_traits::{fetch, Atomic};
use num_traits::{PrimInt, WrappingAdd};
use std::fmt::{Debug, Display};
use std::sync::atomic::Ordering;

/// Ordering used by every operation on an [`AtomicCell`].
pub(crate) const ORDERING: Ordering = Ordering::SeqCst;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// A fixed-width primitive integer that can be stored in an [`AtomicCell`].
///
/// The trait is sealed: it is implemented for every std integer type with a
/// lock-free atomic counterpart and cannot be implemented outside this crate.
///
/// | `T` | Backing atomic |
/// |-----|----------------|
/// | `u8`, `i8` | `AtomicU8`, `AtomicI8` |
/// | `u16`, `i16` | `AtomicU16`, `AtomicI16` |
/// | `u32`, `i32` | `AtomicU32`, `AtomicI32` |
/// | `u64`, `i64` | `AtomicU64`, `AtomicI64` |
/// | `usize`, `isize` | `AtomicUsize`, `AtomicIsize` |
pub trait Integer:
    PrimInt + WrappingAdd + Debug + Display + Send + Sync + 'static + sealed::Sealed
{
    /// The std atomic type holding values of this width.
    type Backing: Atomic<Type = Self> + fetch::Add<Type = Self> + Send + Sync;
}

macro_rules! impl_integer {
    ($($(#[$meta:meta])* $value:ty => $atomic:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            impl sealed::Sealed for $value {}

            $(#[$meta])*
            impl Integer for $value {
                type Backing = $atomic;
            }
        )*
    };
}

impl_integer! {
    u8 => std::sync::atomic::AtomicU8,
    u16 => std::sync::atomic::AtomicU16,
    u32 => std::sync::atomic::AtomicU32,
    #[cfg(target_has_atomic = "64")]
    u64 => std::sync::atomic::AtomicU64,
    usize => std::sync::atomic::AtomicUsize,
    i8 => std::sync::atomic::AtomicI8,
    i16 => std::sync::atomic::AtomicI16,
    i32 => std::sync::atomic::AtomicI32,
    #[cfg(target_has_atomic = "64")]
    i64 => std::sync::atomic::AtomicI64,
    isize => std::sync::atomic::AtomicIsize,
}
