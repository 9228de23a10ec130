//! Series model and wire codec for Postal telemetry.
//!
//! A series travels as a newline-terminated ASCII type tag followed by
//! fixed-size little-endian records (`f64` timestamp, scalar value). This
//! crate turns such blobs into [`Series`] and back, and provides the
//! decompression stage that usually sits in front of decoding.
#![deny(missing_docs)]

pub mod compress;
pub mod decode;
pub mod encode;
pub mod scalar;
pub mod series;
pub mod window;

pub use compress::{Compression, DecompressError, Decompressor, GzipDecompressor, LzmaDecompressor};
pub use decode::{decode, decode_blob, split_type_tag, DecodeError};
pub use encode::{encode, encode_blob, EncodeError};
pub use scalar::ScalarType;
pub use series::{timestamps_equal, Point, Series, Timestamp, Value, EPSILON};
pub use window::FetchWindow;
