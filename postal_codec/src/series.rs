//! Points, values and ordered series.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decode::DecodeError;

/// Timestamp in seconds since the epoch of the dataset.
pub type Timestamp = f64;

/// Tolerance (seconds) under which two timestamps name the same instant.
pub const EPSILON: f64 = 0.001;

/// Returns `true` if `a` and `b` are the same instant within [`EPSILON`].
#[inline]
pub fn timestamps_equal(a: Timestamp, b: Timestamp) -> bool {
    (a - b).abs() <= EPSILON
}

/// A decoded scalar. Integers keep their full 64-bit range so that `u64` and
/// `s64` columns survive decoding untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Any unsigned integer type.
    Unsigned(u64),
    /// Any signed integer type.
    Signed(i64),
    /// `float` or `double`.
    Float(f64),
}

impl Value {
    /// Lossy conversion used for plotting.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Unsigned(v) => v as f64,
            Value::Signed(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    /// Whether this is the "valid" code of a validity series.
    pub fn is_zero(&self) -> bool {
        match *self {
            Value::Unsigned(v) => v == 0,
            Value::Signed(v) => v == 0,
            Value::Float(v) => v == 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident, $target:ty, $($src:ty),+) => {
        $(
            impl From<$src> for Value {
                fn from(v: $src) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )+
    };
}

impl_value_from!(Unsigned, u64, u8, u16, u32, u64);
impl_value_from!(Signed, i64, i8, i16, i32, i64);
impl_value_from!(Float, f64, f32, f64);

/// One sample of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Sample time.
    pub timestamp: Timestamp,
    /// Sample value.
    pub value: Value,
}

impl Point {
    /// Create a point.
    pub fn new(timestamp: Timestamp, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

/// Points of one telemetry key, strictly ascending by timestamp.
///
/// The only way to build a `Series` is through a constructor that checks the
/// ordering, so every consumer may rely on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    points: Vec<Point>,
}

impl Series {
    /// Build a series, rejecting non-finite timestamps and any timestamp that
    /// does not strictly exceed its predecessor.
    pub fn new(points: Vec<Point>) -> Result<Self, DecodeError> {
        if let Some(index) = points.iter().position(|p| !p.timestamp.is_finite()) {
            return Err(DecodeError::NonFiniteTimestamp {
                index,
                timestamp: points[index].timestamp,
            });
        }
        for (index, pair) in points.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp, pair[1].timestamp);
            if !(current > previous) {
                return Err(DecodeError::Unordered {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }
        Ok(Self { points })
    }

    /// Build a series from `(timestamp, value)` pairs.
    pub fn try_from_pairs<I, V>(pairs: I) -> Result<Self, DecodeError>
    where
        I: IntoIterator<Item = (Timestamp, V)>,
        V: Into<Value>,
    {
        Self::new(pairs.into_iter().map(|(t, v)| Point::new(t, v)).collect())
    }

    /// Empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap points already known to be ordered.
    pub(crate) fn from_ordered(points: Vec<Point>) -> Self {
        debug_assert!(points.windows(2).all(|p| p[1].timestamp > p[0].timestamp));
        Self { points }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in ascending time order.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterate over the points.
    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// First and last timestamp, if any.
    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.points.first()?.timestamp, self.points.last()?.timestamp))
    }

    /// Keep only the points for which `keep(index, point)` holds. Order is
    /// preserved, so the result is still a valid series.
    pub fn retain_points<F>(&self, mut keep: F) -> Series
    where
        F: FnMut(usize, &Point) -> bool,
    {
        Series::from_ordered(
            self.points
                .iter()
                .enumerate()
                .filter(|(i, p)| keep(*i, p))
                .map(|(_, p)| *p)
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_equality() {
        assert!(timestamps_equal(1.0, 1.0009));
        assert!(timestamps_equal(1.0009, 1.0));
        assert!(!timestamps_equal(1.0, 1.0021));
    }

    #[test]
    fn rejects_out_of_order_points() {
        let err = Series::try_from_pairs([(0.0, 1), (2.0, 2), (1.0, 3)]).unwrap_err();
        match err {
            DecodeError::Unordered { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(Series::try_from_pairs([(1.0, 1), (1.0, 2)]).is_err());
    }

    #[test]
    fn rejects_non_finite_timestamps() {
        assert!(matches!(
            Series::try_from_pairs([(f64::NAN, 1)]),
            Err(DecodeError::NonFiniteTimestamp { index: 0, .. })
        ));
        assert!(matches!(
            Series::try_from_pairs([(0.0, 1), (f64::INFINITY, 2)]),
            Err(DecodeError::NonFiniteTimestamp { index: 1, .. })
        ));
        assert!(Series::try_from_pairs([(f64::NEG_INFINITY, 1)]).is_err());
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(7u8), Value::Unsigned(7));
        assert_eq!(Value::from(-7i16), Value::Signed(-7));
        assert_eq!(Value::from(1.5f32), Value::Float(1.5));
        assert!(Value::Signed(0).is_zero());
        assert!(Value::Float(-0.0).is_zero());
        assert!(!Value::Unsigned(3).is_zero());
        assert_eq!(Value::Unsigned(u64::MAX).as_f64(), u64::MAX as f64);
    }

    #[test]
    fn time_range_and_retain() {
        let s = Series::try_from_pairs([(0.0, 1), (1.0, 2), (2.0, 3)]).unwrap();
        assert_eq!(s.time_range(), Some((0.0, 2.0)));
        let odd = s.retain_points(|_, p| p.value != Value::Signed(2));
        assert_eq!(odd.len(), 2);
        assert_eq!(Series::empty().time_range(), None);
    }
}
