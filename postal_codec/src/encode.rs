//! Inverse of [`crate::decode`]: the layout the fetch endpoint emits.

use bytes::BufMut;
use thiserror::Error;

use crate::scalar::ScalarType;
use crate::series::{Series, Value};

/// A value cannot be represented in the requested type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    /// Value lies outside the range of the target type.
    #[error("value {value} at record {index} does not fit in {ty}")]
    OutOfRange {
        /// Record index.
        index: usize,
        /// Offending value.
        value: Value,
        /// Requested type.
        ty: ScalarType,
    },
}

/// Encode the records of `series` without the type tag.
pub fn encode(series: &Series, ty: ScalarType) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(series.len() * ty.record_size());
    write_records(&mut out, series, ty)?;
    Ok(out)
}

/// Encode `series` as a full blob: `<tag>\n` followed by the records.
pub fn encode_blob(series: &Series, ty: ScalarType) -> Result<Vec<u8>, EncodeError> {
    let tag = ty.tag();
    let mut out = Vec::with_capacity(tag.len() + 1 + series.len() * ty.record_size());
    out.put_slice(tag.as_bytes());
    out.put_u8(b'\n');
    write_records(&mut out, series, ty)?;
    Ok(out)
}

fn write_records<B: BufMut>(out: &mut B, series: &Series, ty: ScalarType) -> Result<(), EncodeError> {
    for (index, point) in series.iter().enumerate() {
        out.put_f64_le(point.timestamp);
        put_value(out, point.value, ty).ok_or(EncodeError::OutOfRange {
            index,
            value: point.value,
            ty,
        })?;
    }
    Ok(())
}

/// Writes `value` as `ty`; `None` if it does not fit.
fn put_value<B: BufMut>(out: &mut B, value: Value, ty: ScalarType) -> Option<()> {
    match ty {
        ScalarType::U8 => out.put_u8(u8::try_from(as_u64(value)?).ok()?),
        ScalarType::S8 => out.put_i8(i8::try_from(as_i64(value)?).ok()?),
        ScalarType::U16 => out.put_u16_le(u16::try_from(as_u64(value)?).ok()?),
        ScalarType::S16 => out.put_i16_le(i16::try_from(as_i64(value)?).ok()?),
        ScalarType::U32 => out.put_u32_le(u32::try_from(as_u64(value)?).ok()?),
        ScalarType::S32 => out.put_i32_le(i32::try_from(as_i64(value)?).ok()?),
        ScalarType::U64 => out.put_u64_le(as_u64(value)?),
        ScalarType::S64 => out.put_i64_le(as_i64(value)?),
        ScalarType::Float => {
            let v = value.as_f64();
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                return None;
            }
            out.put_f32_le(v as f32)
        }
        ScalarType::Double => out.put_f64_le(value.as_f64()),
    }
    Some(())
}

fn as_u64(value: Value) -> Option<u64> {
    match value {
        Value::Unsigned(v) => Some(v),
        Value::Signed(v) => u64::try_from(v).ok(),
        Value::Float(_) => None,
    }
}

fn as_i64(value: Value) -> Option<i64> {
    match value {
        Value::Unsigned(v) => i64::try_from(v).ok(),
        Value::Signed(v) => Some(v),
        Value::Float(_) => None,
    }
}
