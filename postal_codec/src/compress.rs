//! Decompression stage in front of the decoder.
//!
//! The fetch endpoint compresses blobs with LZMA in the legacy "alone"
//! container; gzip is accepted for sources that sit behind a plain HTTP
//! server. Neither format is defined here, we only call into the codecs.

use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decompression failure.
#[derive(Debug, Error)]
pub enum DecompressError {
    /// LZMA stream is corrupt or truncated.
    #[error("lzma: {0}")]
    Lzma(String),
    /// Gzip stream is corrupt or truncated.
    #[error("gzip: {0}")]
    Gzip(#[from] std::io::Error),
}

/// Turns a compressed blob back into `<tag>\n<records>`.
pub trait Decompressor: Send + Sync {
    /// Decompress the whole input.
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DecompressError>;
}

/// LZMA "alone" (`.lzma`) streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct LzmaDecompressor;

impl Decompressor for LzmaDecompressor {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut reader = input;
        let mut out = Vec::with_capacity(input.len() * 4);
        lzma_rs::lzma_decompress(&mut reader, &mut out)
            .map_err(|e| DecompressError::Lzma(e.to_string()))?;
        Ok(out)
    }
}

/// Gzip streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut out = Vec::with_capacity(input.len() * 4);
        flate2::read::GzDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Compression applied by the data source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Blobs arrive uncompressed; the stage is skipped.
    None,
    /// LZMA alone format.
    #[default]
    Lzma,
    /// Gzip.
    Gzip,
}

impl Compression {
    /// Decompressor for this setting, or `None` to skip the stage.
    pub fn decompressor(&self) -> Option<Box<dyn Decompressor>> {
        match self {
            Compression::None => None,
            Compression::Lzma => Some(Box::new(LzmaDecompressor)),
            Compression::Gzip => Some(Box::new(GzipDecompressor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BLOB: &[u8] = b"u8\n\x00\x00\x00\x00\x00\x00\xf0\x3f\x07";

    #[test]
    fn lzma_roundtrip() {
        let mut compressed = Vec::new();
        lzma_rs::lzma_compress(&mut &BLOB[..], &mut compressed).unwrap();
        let out = LzmaDecompressor.decompress(&compressed).unwrap();
        assert_eq!(out, BLOB);
    }

    #[test]
    fn gzip_roundtrip() {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(BLOB).unwrap();
        let compressed = encoder.finish().unwrap();
        let out = GzipDecompressor.decompress(&compressed).unwrap();
        assert_eq!(out, BLOB);
    }

    #[test]
    fn corrupt_input() {
        assert!(matches!(
            LzmaDecompressor.decompress(b"not lzma"),
            Err(DecompressError::Lzma(_))
        ));
        assert!(matches!(
            GzipDecompressor.decompress(b"not gzip"),
            Err(DecompressError::Gzip(_))
        ));
    }

    #[test]
    fn compression_setting() {
        assert!(Compression::None.decompressor().is_none());
        assert!(Compression::Gzip.decompressor().is_some());
        assert_eq!(Compression::default(), Compression::Lzma);
    }
}
