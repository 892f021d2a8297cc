//! Parallel reductions built on [`NumericValue`](crate::cells::NumericValue).
//!
//! - [`range`] - split a numeric range across threads and sum it into one
//!   shared accumulator
//!
//! # Error Handling
//!
//! All reductions return [`Result`], whose error type is [`ReduceError`].
//!
//! # Example
//!
//! ```rust
//! use numeri::cells::CellFactory;
//! use numeri::reducers::{RangeReducer, ReduceError};
//!
//! let factory = CellFactory::<u64>::new();
//! let sum = factory.value(0);
//! let lo = factory.value(0);
//! let hi = factory.value(100);
//!
//! let reducer = RangeReducer::new().with_name("gauss");
//! reducer.reduce(&sum, &lo, &hi, 4)?;
//! assert_eq!(sum.value(), 5050);
//!
//! assert!(matches!(
//!     reducer.reduce(&sum, &lo, &hi, 0),
//!     Err(ReduceError::InvalidWorkerCount { worker_count: 0 })
//! ));
//! # Ok::<(), ReduceError>(())
//! ```

mod error;
pub mod range;

pub use error::{ReduceError, Result};
pub use range::{RangeReducer, Slice};
