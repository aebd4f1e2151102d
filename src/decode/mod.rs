//! Frame decoding.
//!
//! Turns the encoded bytes returned by the monitor interface into a
//! [`Frame`]: dimensions, pixel resolution and a contiguous row-major
//! buffer of 32-bit samples. Decoding is a pure transform; a frame that
//! fails any check is never returned.

mod frame;
mod strips;
mod tiff;

pub use self::tiff::TiffStrips;
pub use frame::Frame;
pub use strips::{reassemble, DecodeError, StripLayout, StripSource};

use std::io::Cursor;

/// Decodes an encoded monitor image into a frame.
pub fn decode_frame(encoded: &[u8]) -> Result<Frame, DecodeError> {
    let mut strips = TiffStrips::open(Cursor::new(encoded))?;
    let frame = reassemble(&mut strips)?;
    debug_assert!(frame.is_valid());
    Ok(frame)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use ::tiff::encoder::Rational;

    #[test]
    fn test_decode_yields_width_times_height_samples() {
        let pixels: Vec<u32> = (0..100 * 37).map(|i| i % 4096).collect();
        let frame = decode_frame(&encode_tiff(100, 37, &pixels, 5)).unwrap();

        assert_eq!(frame.pixels().len(), 100 * 37);
        assert_eq!(frame.pixels(), &pixels[..]);
    }

    #[test]
    fn test_decode_reads_resolution() {
        let pixels = vec![0u32; 16];
        let bytes = encode_tiff_with_resolution(
            4,
            4,
            &pixels,
            2,
            Some((Rational { n: 3, d: 40 }, Rational { n: 1, d: 8 })),
        );

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(frame.resolution_x(), 0.075);
        assert_eq!(frame.resolution_y(), 0.125);
    }

    #[test]
    fn test_truncated_buffer_fails() {
        let pixels: Vec<u32> = (0..64 * 64).collect();
        let bytes = encode_tiff(64, 64, &pixels, 8);

        let truncated = &bytes[..bytes.len() / 2];
        assert!(decode_frame(truncated).is_err());
    }

    /// Little-endian TIFF whose IFD declares `width`x`height` but carries
    /// only 16 bytes of strip data.
    fn tiff_declaring(width: u32, height: u32) -> Vec<u8> {
        let entries: [(u16, u16, u32); 10] = [
            (256, 4, width),  // ImageWidth
            (257, 4, height), // ImageLength
            (258, 3, 32),     // BitsPerSample
            (259, 3, 1),      // Compression: none
            (262, 3, 1),      // PhotometricInterpretation: BlackIsZero
            (273, 4, 0),      // StripOffsets, patched below
            (277, 3, 1),      // SamplesPerPixel
            (278, 4, height), // RowsPerStrip
            (279, 4, 16),     // StripByteCounts
            (339, 3, 1),      // SampleFormat: unsigned
        ];
        let data_offset = 8 + 2 + entries.len() as u32 * 12 + 4;

        let mut bytes = b"II*\0".to_vec();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, kind, value) in entries {
            let value = if tag == 273 { data_offset } else { value };
            bytes.extend_from_slice(&tag.to_le_bytes());
            bytes.extend_from_slice(&kind.to_le_bytes());
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    #[test]
    fn test_huge_declared_dimensions_rejected() {
        let bytes = tiff_declaring(1 << 20, 1 << 20);
        assert!(bytes.len() < 200);

        assert!(matches!(
            decode_frame(&bytes),
            Err(DecodeError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_empty_buffer_fails() {
        assert!(matches!(decode_frame(&[]), Err(DecodeError::Open(_))));
    }
}
