//! Two-phase decoding: type tag, then fixed-size records.

use bytes::Buf;
use thiserror::Error;

use crate::scalar::ScalarType;
use crate::series::{Point, Series, Timestamp, Value};

/// Longest type tag we are willing to scan for.
const MAX_TAG_LEN: usize = 16;

/// Malformed series input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Payload length is not a multiple of the record size.
    #[error("truncated payload: {len} bytes is not a multiple of the {record_size}-byte record")]
    Truncated {
        /// Payload length in bytes.
        len: usize,
        /// Record size for the declared type.
        record_size: usize,
    },
    /// A timestamp did not strictly exceed the one before it.
    #[error("unordered timestamps at record {index}: {current} follows {previous}")]
    Unordered {
        /// Index of the offending record.
        index: usize,
        /// Timestamp of the preceding record.
        previous: Timestamp,
        /// Timestamp of the offending record.
        current: Timestamp,
    },
    /// A timestamp is NaN or infinite.
    #[error("non-finite timestamp {timestamp} at record {index}")]
    NonFiniteTimestamp {
        /// Index of the offending record.
        index: usize,
        /// The timestamp as read.
        timestamp: Timestamp,
    },
    /// Type tag names no supported scalar type.
    #[error("unknown value type {0:?}")]
    UnknownType(String),
    /// Blob does not start with a newline-terminated type tag.
    #[error("missing type tag")]
    MissingTypeTag,
}

/// Phase one: split `<tag>\n<payload>` into the scalar type and the payload.
pub fn split_type_tag(blob: &[u8]) -> Result<(ScalarType, &[u8]), DecodeError> {
    let newline = blob
        .iter()
        .take(MAX_TAG_LEN + 1)
        .position(|&b| b == b'\n')
        .ok_or(DecodeError::MissingTypeTag)?;
    let tag = &blob[..newline];
    if !tag.is_ascii() {
        return Err(DecodeError::UnknownType(String::from_utf8_lossy(tag).into_owned()));
    }
    // ASCII is always valid UTF-8.
    let tag = std::str::from_utf8(tag).map_err(|_| DecodeError::MissingTypeTag)?;
    Ok((ScalarType::parse(tag)?, &blob[newline + 1..]))
}

/// Phase two: decode records of type `ty` until the payload is exhausted.
pub fn decode(payload: &[u8], ty: ScalarType) -> Result<Series, DecodeError> {
    let record_size = ty.record_size();
    if payload.len() % record_size != 0 {
        return Err(DecodeError::Truncated {
            len: payload.len(),
            record_size,
        });
    }

    let count = payload.len() / record_size;
    let mut points = Vec::with_capacity(count);
    let mut cursor = payload;
    let mut previous: Option<Timestamp> = None;
    for index in 0..count {
        let timestamp = cursor.get_f64_le();
        if !timestamp.is_finite() {
            return Err(DecodeError::NonFiniteTimestamp { index, timestamp });
        }
        if let Some(previous) = previous {
            if !(timestamp > previous) {
                return Err(DecodeError::Unordered {
                    index,
                    previous,
                    current: timestamp,
                });
            }
        }
        previous = Some(timestamp);
        let value = read_value(&mut cursor, ty);
        points.push(Point { timestamp, value });
    }
    Ok(Series::from_ordered(points))
}

/// Both phases over a full blob.
pub fn decode_blob(blob: &[u8]) -> Result<Series, DecodeError> {
    let (ty, payload) = split_type_tag(blob)?;
    decode(payload, ty)
}

fn read_value<B: Buf>(buf: &mut B, ty: ScalarType) -> Value {
    match ty {
        ScalarType::U8 => Value::Unsigned(buf.get_u8() as u64),
        ScalarType::S8 => Value::Signed(buf.get_i8() as i64),
        ScalarType::U16 => Value::Unsigned(buf.get_u16_le() as u64),
        ScalarType::S16 => Value::Signed(buf.get_i16_le() as i64),
        ScalarType::U32 => Value::Unsigned(buf.get_u32_le() as u64),
        ScalarType::S32 => Value::Signed(buf.get_i32_le() as i64),
        ScalarType::U64 => Value::Unsigned(buf.get_u64_le()),
        ScalarType::S64 => Value::Signed(buf.get_i64_le()),
        ScalarType::Float => Value::Float(buf.get_f32_le() as f64),
        ScalarType::Double => Value::Float(buf.get_f64_le()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, encode_blob};

    fn boundaries(ty: ScalarType) -> Vec<Value> {
        match ty {
            ScalarType::U8 => vec![0u8.into(), u8::MIN.into(), u8::MAX.into()],
            ScalarType::S8 => vec![0i8.into(), i8::MIN.into(), i8::MAX.into()],
            ScalarType::U16 => vec![0u16.into(), u16::MIN.into(), u16::MAX.into()],
            ScalarType::S16 => vec![0i16.into(), i16::MIN.into(), i16::MAX.into()],
            ScalarType::U32 => vec![0u32.into(), u32::MIN.into(), u32::MAX.into()],
            ScalarType::S32 => vec![0i32.into(), i32::MIN.into(), i32::MAX.into()],
            ScalarType::U64 => vec![0u64.into(), u64::MIN.into(), u64::MAX.into()],
            ScalarType::S64 => vec![0i64.into(), i64::MIN.into(), i64::MAX.into()],
            ScalarType::Float => vec![0f32.into(), f32::MIN.into(), f32::MAX.into()],
            ScalarType::Double => vec![0f64.into(), f64::MIN.into(), f64::MAX.into()],
        }
    }

    #[test]
    fn roundtrip_boundaries_for_every_type() {
        for ty in ScalarType::ALL {
            let points = boundaries(ty)
                .into_iter()
                .enumerate()
                .map(|(i, v)| Point {
                    timestamp: 1_600_000_000.0 + i as f64 * 0.5,
                    value: v,
                })
                .collect();
            let series = Series::new(points).unwrap();
            let blob = encode_blob(&series, ty).unwrap();
            assert_eq!(decode_blob(&blob).unwrap(), series, "type {ty}");
        }
    }

    #[test]
    fn reads_little_endian_records() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&2.5f64.to_le_bytes());
        payload.extend_from_slice(&(-300i16).to_le_bytes());
        payload.extend_from_slice(&3.0f64.to_le_bytes());
        payload.extend_from_slice(&(42i16).to_le_bytes());
        let series = decode(&payload, ScalarType::S16).unwrap();
        assert_eq!(series.points(), &[Point::new(2.5, -300i16), Point::new(3.0, 42i16)]);
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let series = Series::try_from_pairs([(0.0, 1u32), (1.0, 2u32)]).unwrap();
        let payload = encode(&series, ScalarType::U32).unwrap();
        let err = decode(&payload[..payload.len() - 1], ScalarType::U32).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                len: 23,
                record_size: 12
            }
        );
    }

    #[test]
    fn decreasing_timestamps_are_rejected() {
        let mut payload = Vec::new();
        for t in [1.0f64, 3.0, 2.0] {
            payload.extend_from_slice(&t.to_le_bytes());
            payload.push(0);
        }
        assert!(matches!(
            decode(&payload, ScalarType::U8),
            Err(DecodeError::Unordered { index: 2, .. })
        ));
    }

    #[test]
    fn non_finite_timestamps_are_rejected() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&f64::NAN.to_le_bytes());
        payload.push(1);
        assert!(matches!(
            decode(&payload, ScalarType::U8),
            Err(DecodeError::NonFiniteTimestamp { index: 0, .. })
        ));

        let mut payload = Vec::new();
        for t in [1.0f64, f64::INFINITY] {
            payload.extend_from_slice(&t.to_le_bytes());
            payload.push(0);
        }
        assert!(matches!(
            decode(&payload, ScalarType::U8),
            Err(DecodeError::NonFiniteTimestamp { index: 1, .. })
        ));
    }

    #[test]
    fn tag_phase_errors() {
        assert_eq!(decode_blob(b"u8"), Err(DecodeError::MissingTypeTag));
        assert_eq!(
            decode_blob(b"bool\n"),
            Err(DecodeError::UnknownType("bool".to_string()))
        );
        let (ty, payload) = split_type_tag(b"double\n").unwrap();
        assert_eq!(ty, ScalarType::Double);
        assert!(payload.is_empty());
        assert!(decode_blob(b"double\n").unwrap().is_empty());
    }
}
