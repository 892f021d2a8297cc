//! Serde support for numeric values.
//!
//! A [`NumericValue`] serializes as the number it currently holds and
//! deserializes into a fresh private value: storage sharing never survives a
//! round trip. [`ValueSnapshot`] additionally records whether the value was
//! sharing its cell when captured.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! numeri = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use numeri::cells::NumericValue;
//! use numeri::snapshot::ValueSnapshot;
//!
//! let sum = NumericValue::new(5050u64);
//! let json = serde_json::to_string(&sum).unwrap();
//! assert_eq!(json, "5050");
//!
//! let snapshot = ValueSnapshot::from_value(&sum);
//! let json = serde_json::to_string(&snapshot).unwrap();
//! assert_eq!(json, r#"{"value":5050,"shared":false}"#);
//! ```

use crate::cells::{Integer, NumericValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A point-in-time capture of a [`NumericValue`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValueSnapshot<T> {
    /// The value held at capture time.
    pub value: T,
    /// Whether the value was sharing its cell with another instance.
    pub shared: bool,
}

impl<T: Integer> ValueSnapshot<T> {
    /// Captures the current state of `value`.
    ///
    /// The two fields are read independently.
    pub fn from_value(value: &NumericValue<T>) -> Self {
        Self {
            value: value.value(),
            shared: value.is_shared(),
        }
    }

    /// Creates a private [`NumericValue`] holding the captured number.
    pub fn restore(&self) -> NumericValue<T> {
        NumericValue::new(self.value)
    }
}

impl<T: Integer + Serialize> Serialize for NumericValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de, T: Integer + Deserialize<'de>> Deserialize<'de> for NumericValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(NumericValue::new)
    }
}
