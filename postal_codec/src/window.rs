//! Time window and rate decimation applied to freshly decoded series.

use serde::{Deserialize, Serialize};

use crate::series::{Series, Timestamp};

/// Restricts which points of a series are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchWindow {
    /// Keep points at or after this time.
    #[serde(default)]
    pub start: Option<Timestamp>,
    /// Keep points strictly before this time.
    #[serde(default)]
    pub end: Option<Timestamp>,
    /// Minimum spacing in seconds between kept points, measured from the last
    /// kept point (the reference starts at t = 0).
    #[serde(default)]
    pub rate: Option<f64>,
}

impl FetchWindow {
    /// Whether the window keeps every point.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.rate.is_none()
    }

    /// Apply the window to `series`.
    pub fn apply(&self, series: &Series) -> Series {
        if self.is_unbounded() {
            return series.clone();
        }
        let mut last_kept: Timestamp = 0.0;
        series.retain_points(|_, point| {
            let t = point.timestamp;
            if self.start.is_some_and(|start| t < start) || self.end.is_some_and(|end| t >= end) {
                return false;
            }
            if let Some(rate) = self.rate {
                if t - last_kept < rate {
                    return false;
                }
            }
            last_kept = t;
            true
        })
    }
}
