//! Frame type representing one decoded detector image.

use std::io::{self, Write};

/// A single decoded frame.
///
/// Pixels are 32-bit unsigned counts, row-major, with no padding
/// between rows.
#[derive(Clone, PartialEq)]
pub struct Frame {
    /// Pixel samples.
    pixels: Vec<u32>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Horizontal pixel resolution as reported by the detector (0.0 if unset).
    resolution_x: f64,
    /// Vertical pixel resolution as reported by the detector (0.0 if unset).
    resolution_y: f64,
}

impl Frame {
    /// Creates a new frame with unset resolution.
    pub fn new(pixels: Vec<u32>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
            resolution_x: 0.0,
            resolution_y: 0.0,
        }
    }

    /// Sets the horizontal and vertical pixel resolution.
    pub fn with_resolution(mut self, x: f64, y: f64) -> Self {
        self.resolution_x = x;
        self.resolution_y = y;
        self
    }

    /// Returns a reference to the pixel samples.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the horizontal pixel resolution.
    #[inline]
    pub fn resolution_x(&self) -> f64 {
        self.resolution_x
    }

    /// Returns the vertical pixel resolution.
    #[inline]
    pub fn resolution_y(&self) -> f64 {
        self.resolution_y
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Size of the raw pixel payload in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<u32>()
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.pixel_count()
    }

    /// Writes the pixels as little-endian 32-bit samples.
    pub fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for sample in &self.pixels {
            writer.write_all(&sample.to_le_bytes())?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("resolution_x", &self.resolution_x)
            .field("resolution_y", &self.resolution_y)
            .field("pixel_bytes", &self.byte_len())
            .finish()
    }
}
