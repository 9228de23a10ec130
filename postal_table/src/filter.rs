//! Validity-mask filtering.
//!
//! A validity series carries one code per sample of its data series: zero
//! means valid, anything else means invalid. Both are ascending and sampled
//! at the same instants; filtering walks them in lockstep.

use postal_codec::{timestamps_equal, Series, Timestamp, EPSILON};
use thiserror::Error;

/// The validity series is not time-aligned with the data series.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("validity sample at {validity_timestamp} does not line up with data sample at {series_timestamp}")]
pub struct FilterAlignmentError {
    /// Timestamp of the data point being filtered.
    pub series_timestamp: Timestamp,
    /// Timestamp of the most recent validity sample at or before it.
    pub validity_timestamp: Timestamp,
}

/// Keep the points of `series` whose validity code is zero.
///
/// If `validity` ends before `series`, the trailing data points are dropped
/// rather than reported.
pub fn filter(series: &Series, validity: &Series) -> Result<Series, FilterAlignmentError> {
    let codes = validity.points();
    if codes.is_empty() {
        return Ok(Series::empty());
    }

    let mut keep = vec![false; series.len()];
    let mut cursor = 0usize;
    for (index, point) in series.iter().enumerate() {
        let t = point.timestamp;
        while cursor + 1 < codes.len() && codes[cursor + 1].timestamp <= t + EPSILON {
            cursor += 1;
        }

        let current = codes[cursor];
        if current.timestamp < t - EPSILON && cursor + 1 == codes.len() {
            break;
        }
        if !timestamps_equal(current.timestamp, t) {
            return Err(FilterAlignmentError {
                series_timestamp: t,
                validity_timestamp: current.timestamp,
            });
        }
        keep[index] = current.value.is_zero();
    }

    Ok(series.retain_points(|index, _| keep[index]))
}
