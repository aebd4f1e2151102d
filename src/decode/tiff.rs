//! TIFF strip access.
//!
//! The detector's monitor interface serves single-channel 32-bit unsigned
//! TIFF images organised in strips. Anything else is rejected.

use std::io::{Read, Seek};

use tiff::decoder::ifd::Value;
use tiff::decoder::{ChunkType, Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

use super::strips::{DecodeError, StripLayout, StripSource};

/// Strip reader over an encoded TIFF image.
pub struct TiffStrips<R: Read + Seek> {
    decoder: Decoder<R>,
}

impl<R: Read + Seek> TiffStrips<R> {
    /// Opens the container and checks the sample layout.
    pub fn open(reader: R) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(reader).map_err(|e| DecodeError::Open(e.to_string()))?;

        let color = decoder
            .colortype()
            .map_err(|e| DecodeError::Open(e.to_string()))?;
        if color != ColorType::Gray(32) {
            return Err(DecodeError::Unsupported(format!(
                "expected 32-bit grayscale samples, found {color:?}"
            )));
        }
        if decoder.get_chunk_type() != ChunkType::Strip {
            return Err(DecodeError::Unsupported("tiled images".to_string()));
        }

        Ok(Self { decoder })
    }

    /// Reads a resolution tag, defaulting to 0.0 when absent or unreadable.
    fn resolution(&mut self, tag: Tag) -> f64 {
        match self.decoder.find_tag(tag) {
            Ok(Some(value)) => rational_to_f64(value).unwrap_or_else(|| {
                tracing::debug!(?tag, "Ignoring non-numeric resolution tag");
                0.0
            }),
            Ok(None) => 0.0,
            Err(e) => {
                tracing::debug!(?tag, error = %e, "Failed to read resolution tag");
                0.0
            }
        }
    }
}

fn rational_to_f64(value: Value) -> Option<f64> {
    match value {
        Value::Rational(_, 0) => Some(0.0),
        Value::Rational(n, d) => Some(f64::from(n) / f64::from(d)),
        Value::Float(v) => Some(f64::from(v)),
        Value::Double(v) => Some(v),
        Value::Short(v) => Some(f64::from(v)),
        Value::Unsigned(v) => Some(f64::from(v)),
        _ => None,
    }
}

impl<R: Read + Seek> StripSource for TiffStrips<R> {
    fn layout(&mut self) -> Result<StripLayout, DecodeError> {
        let (width, height) = self
            .decoder
            .dimensions()
            .map_err(|e| DecodeError::Open(e.to_string()))?;
        let strip_count = self
            .decoder
            .strip_count()
            .map_err(|e| DecodeError::Open(e.to_string()))?;

        let (_, rows_per_strip) = self.decoder.chunk_dimensions();
        let strip_rows = rows_per_strip.min(height) as usize;
        let strip_bytes = (width as usize)
            .checked_mul(strip_rows)
            .and_then(|n| n.checked_mul(std::mem::size_of::<u32>()))
            .ok_or_else(|| DecodeError::InvalidLayout("strip size overflows".to_string()))?;

        Ok(StripLayout {
            width,
            height,
            resolution_x: self.resolution(Tag::XResolution),
            resolution_y: self.resolution(Tag::YResolution),
            strip_bytes,
            strip_count,
        })
    }

    fn read_strip(&mut self, index: u32) -> Result<Vec<u8>, DecodeError> {
        match self.decoder.read_chunk(index) {
            Ok(DecodingResult::U32(samples)) => {
                Ok(samples.iter().flat_map(|s| s.to_le_bytes()).collect())
            }
            Ok(_) => Err(DecodeError::Strip {
                index,
                reason: "strip did not decode to 32-bit samples".to_string(),
            }),
            Err(e) => Err(DecodeError::Strip {
                index,
                reason: e.to_string(),
            }),
        }
    }
}
