//! Strip reassembly.
//!
//! Container formats store the image as a run of strips, each holding a
//! fixed number of rows. Every strip is copied into the output buffer at
//! `strip_index * strip_bytes`, so a failure partway through never shifts
//! later data. Any failure discards the whole buffer.

use thiserror::Error;

use super::Frame;

const SAMPLE_BYTES: usize = std::mem::size_of::<u32>();

/// Largest decoded image accepted, in bytes (256 Mpixel of 32-bit samples).
pub const MAX_IMAGE_BYTES: usize = 1 << 30;

/// Errors raised while decoding an encoded frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open encoded image: {0}")]
    Open(String),
    #[error("unsupported image layout: {0}")]
    Unsupported(String),
    #[error("invalid strip layout: {0}")]
    InvalidLayout(String),
    #[error("failed to read strip {index}: {reason}")]
    Strip { index: u32, reason: String },
    #[error("strip {index} has {actual} bytes, expected {expected}")]
    StripSize {
        index: u32,
        expected: usize,
        actual: usize,
    },
    #[error("strip {index} runs past the end of the image buffer")]
    Overrun { index: u32 },
    #[error("strips cover {actual} bytes, image needs {expected}")]
    Coverage { expected: usize, actual: usize },
}

/// Geometry of a strip-organised image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripLayout {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Horizontal pixel resolution (0.0 if absent).
    pub resolution_x: f64,
    /// Vertical pixel resolution (0.0 if absent).
    pub resolution_y: f64,
    /// Size of a full strip in bytes. Only the last strip may be shorter.
    pub strip_bytes: usize,
    /// Number of strips.
    pub strip_count: u32,
}

impl StripLayout {
    /// Bytes needed to hold `width * height` samples.
    pub fn image_bytes(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(SAMPLE_BYTES)
    }
}

/// Random access to the decoded strips of one encoded image.
pub trait StripSource {
    /// Reads the container metadata.
    fn layout(&mut self) -> Result<StripLayout, DecodeError>;

    /// Decodes strip `index` into raw little-endian sample bytes.
    fn read_strip(&mut self, index: u32) -> Result<Vec<u8>, DecodeError>;
}

/// Decodes every strip of `source` into a single frame.
pub fn reassemble<S: StripSource + ?Sized>(source: &mut S) -> Result<Frame, DecodeError> {
    let layout = source.layout()?;

    if layout.width == 0 || layout.height == 0 {
        return Err(DecodeError::InvalidLayout(format!(
            "image is {}x{}",
            layout.width, layout.height
        )));
    }
    let expected = layout
        .image_bytes()
        .ok_or_else(|| DecodeError::InvalidLayout("image size overflows".to_string()))?;
    if layout.strip_bytes == 0 || layout.strip_bytes % SAMPLE_BYTES != 0 {
        return Err(DecodeError::InvalidLayout(format!(
            "strip size {} is not a whole number of samples",
            layout.strip_bytes
        )));
    }
    if layout.strip_count == 0 {
        return Err(DecodeError::InvalidLayout("image has no strips".to_string()));
    }
    if expected > MAX_IMAGE_BYTES {
        return Err(DecodeError::InvalidLayout(format!(
            "{}x{} image needs {} bytes, limit is {}",
            layout.width, layout.height, expected, MAX_IMAGE_BYTES
        )));
    }

    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(expected / SAMPLE_BYTES)
        .map_err(|e| DecodeError::InvalidLayout(format!("cannot allocate image buffer: {e}")))?;
    pixels.resize(expected / SAMPLE_BYTES, 0u32);
    let mut covered = 0usize;

    for index in 0..layout.strip_count {
        let bytes = source.read_strip(index)?;

        let is_last = index + 1 == layout.strip_count;
        let short_tail = is_last && bytes.len() < layout.strip_bytes;
        if (bytes.len() != layout.strip_bytes && !short_tail) || bytes.len() % SAMPLE_BYTES != 0 {
            return Err(DecodeError::StripSize {
                index,
                expected: layout.strip_bytes,
                actual: bytes.len(),
            });
        }

        let offset = index as usize * layout.strip_bytes;
        if offset + bytes.len() > expected {
            return Err(DecodeError::Overrun { index });
        }

        let start = offset / SAMPLE_BYTES;
        for (dst, chunk) in pixels[start..]
            .iter_mut()
            .zip(bytes.chunks_exact(SAMPLE_BYTES))
        {
            *dst = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        covered += bytes.len();

        tracing::trace!(index, bytes = bytes.len(), offset, "Copied strip");
    }

    if covered != expected {
        return Err(DecodeError::Coverage {
            expected,
            actual: covered,
        });
    }

    Ok(Frame::new(pixels, layout.width, layout.height)
        .with_resolution(layout.resolution_x, layout.resolution_y))
}
