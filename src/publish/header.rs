//! Fixed-size image header.
//!
//! The viewer expects a 512-byte ASCII header of `KEY=value;` lines in
//! braces, space padded, directly followed by the pixel data.

use std::fmt::Write as _;

use thiserror::Error;

use crate::decode::Frame;
use crate::metadata::{AcquisitionMetadata, MetadataError};

/// Header size in bytes, including padding.
pub const HEADER_BYTES: usize = 512;

/// The rendered header text did not fit.
#[derive(Debug, Clone, Error)]
#[error("header text is {length} bytes, limit is {HEADER_BYTES}")]
pub struct HeaderOverflowError {
    /// Length of the rendered text before padding.
    pub length: usize,
}

/// Values written into the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderFields {
    pub width: u32,
    pub height: u32,
    /// Pixel resolution along X, as reported by the detector.
    pub pixel_size_x: f64,
    /// Pixel resolution along Y, as reported by the detector.
    pub pixel_size_y: f64,
    /// Beam center X in pixels.
    pub beam_center_x: f64,
    /// Beam center Y in pixels.
    pub beam_center_y: f64,
    /// Detector distance in meters.
    pub detector_distance: f64,
    /// Incident wavelength in Å.
    pub wavelength: f64,
}

impl HeaderFields {
    /// Combines a decoded frame with sampled metadata.
    pub fn new(frame: &Frame, metadata: &AcquisitionMetadata) -> Result<Self, MetadataError> {
        Ok(Self {
            width: frame.width(),
            height: frame.height(),
            pixel_size_x: frame.resolution_x(),
            pixel_size_y: frame.resolution_y(),
            beam_center_x: metadata.beam_center_x,
            beam_center_y: metadata.beam_center_y,
            detector_distance: metadata.detector_distance,
            wavelength: metadata.wavelength()?,
        })
    }
}

/// A rendered, padded header.
#[derive(Clone, PartialEq, Eq)]
pub struct Header([u8; HEADER_BYTES]);

impl Header {
    /// Header bytes, always exactly [`HEADER_BYTES`] long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Header text with trailing padding removed.
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.0)
            .unwrap_or_default()
            .trim_end_matches(' ')
    }
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Header").field(&self.text()).finish()
    }
}

/// Renders a float with up to six decimals, trailing zeros trimmed but
/// at least one fractional digit kept (`155.25`, `150.0`).
fn format_decimal(value: f64) -> String {
    let mut text = format!("{value:.6}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').len();
        text.truncate(trimmed);
        if text.ends_with('.') {
            text.push('0');
        }
    }
    text
}

/// Renders the header text and pads it to [`HEADER_BYTES`].
pub fn synthesize_header(fields: &HeaderFields) -> Result<Header, HeaderOverflowError> {
    let mut text = String::with_capacity(HEADER_BYTES);
    let mut line = |key: &str, value: &dyn std::fmt::Display| {
        // Writing to a String cannot fail.
        let _ = writeln!(text, "{key}={value};");
    };

    line("HEADER_BYTES", &HEADER_BYTES);
    line("DIM", &2);
    line("BYTE_ORDER", &"little_endian");
    line("TYPE", &"unsigned_int");
    line("SIZE1", &fields.width);
    line("SIZE2", &fields.height);
    line("PIXEL_SIZE", &format_decimal(fields.pixel_size_x));
    line(
        "BEAM_CENTER_X",
        &format_decimal(fields.beam_center_x * fields.pixel_size_x),
    );
    line(
        "BEAM_CENTER_Y",
        &format_decimal(fields.beam_center_y * fields.pixel_size_y),
    );
    line("DISTANCE", &format_decimal(fields.detector_distance * 1000.0));
    line("WAVELENGTH", &format_decimal(fields.wavelength));

    let text = format!("{{\n{text}}}\n");
    if text.len() > HEADER_BYTES {
        return Err(HeaderOverflowError { length: text.len() });
    }

    let mut bytes = [b' '; HEADER_BYTES];
    bytes[..text.len()].copy_from_slice(text.as_bytes());
    Ok(Header(bytes))
}
