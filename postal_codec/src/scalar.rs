//! Scalar type tags carried in front of every series blob.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decode::DecodeError;

/// Type of every value in one series blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// `u8`
    U8,
    /// `s8`
    S8,
    /// `u16`
    U16,
    /// `s16`
    S16,
    /// `u32`
    U32,
    /// `s32`
    S32,
    /// `u64`
    U64,
    /// `s64`
    S64,
    /// `float` (IEEE-754 binary32)
    Float,
    /// `double` (IEEE-754 binary64)
    Double,
}

impl ScalarType {
    /// Every supported tag.
    pub const ALL: [ScalarType; 10] = [
        ScalarType::U8,
        ScalarType::S8,
        ScalarType::U16,
        ScalarType::S16,
        ScalarType::U32,
        ScalarType::S32,
        ScalarType::U64,
        ScalarType::S64,
        ScalarType::Float,
        ScalarType::Double,
    ];

    /// Parse the ASCII wire token.
    pub fn parse(tag: &str) -> Result<Self, DecodeError> {
        let ty = match tag {
            "u8" => ScalarType::U8,
            "s8" => ScalarType::S8,
            "u16" => ScalarType::U16,
            "s16" => ScalarType::S16,
            "u32" => ScalarType::U32,
            "s32" => ScalarType::S32,
            "u64" => ScalarType::U64,
            "s64" => ScalarType::S64,
            "float" => ScalarType::Float,
            "double" => ScalarType::Double,
            other => return Err(DecodeError::UnknownType(other.to_string())),
        };
        Ok(ty)
    }

    /// Wire token, without the trailing newline.
    pub fn tag(&self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::S8 => "s8",
            ScalarType::U16 => "u16",
            ScalarType::S16 => "s16",
            ScalarType::U32 => "u32",
            ScalarType::S32 => "s32",
            ScalarType::U64 => "u64",
            ScalarType::S64 => "s64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Size of one value in bytes.
    pub fn size(&self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::S8 => 1,
            ScalarType::U16 | ScalarType::S16 => 2,
            ScalarType::U32 | ScalarType::S32 | ScalarType::Float => 4,
            ScalarType::U64 | ScalarType::S64 | ScalarType::Double => 8,
        }
    }

    /// Size of one record: timestamp plus value.
    #[inline]
    pub fn record_size(&self) -> usize {
        8 + self.size()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ScalarType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalarType::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for ty in ScalarType::ALL {
            assert_eq!(ScalarType::parse(ty.tag()).unwrap(), ty);
            assert_eq!(ty.to_string().parse::<ScalarType>().unwrap(), ty);
        }
    }

    #[test]
    fn record_sizes() {
        assert_eq!(ScalarType::U8.record_size(), 9);
        assert_eq!(ScalarType::S16.record_size(), 10);
        assert_eq!(ScalarType::Float.record_size(), 12);
        assert_eq!(ScalarType::Double.record_size(), 16);
    }

    #[test]
    fn unknown_tag() {
        assert!(matches!(
            ScalarType::parse("int128"),
            Err(DecodeError::UnknownType(t)) if t == "int128"
        ));
    }
}
