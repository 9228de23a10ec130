//! Errors surfaced by session operations.

use postal_codec::{DecodeError, DecompressError};
use postal_source::FetchError;
use postal_table::FilterAlignmentError;
use thiserror::Error;

/// Why adding a series to the plot failed. The tables are untouched in every case.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Fetching raw bytes failed or timed out.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The blob could not be decompressed.
    #[error(transparent)]
    Decompress(#[from] DecompressError),
    /// The blob is malformed.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The validity series does not line up with the data series.
    #[error(transparent)]
    Filter(#[from] FilterAlignmentError),
    /// The label already has a column.
    #[error("{0:?} is already plotted")]
    AlreadyPlotted(String),
}
