//! PNG encoding using the `image` crate's encoder.

use image::codecs::png::PngEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

/// The eight bytes every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Errors that can occur during PNG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGBA pixel data to PNG bytes.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
///
/// PNG-encoded bytes on success, or an error if encoding fails.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=32, 1u32..=32)
    }

    proptest! {
        /// Property: Same input always produces the same bytes.
        #[test]
        fn prop_deterministic_output(
            (width, height) in dimensions_strategy(),
            seed in any::<u8>(),
        ) {
            let size = (width as usize) * (height as usize) * 4;
            let pixels: Vec<u8> = (0..size).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();

            let first = encode_png(&pixels, width, height).unwrap();
            let second = encode_png(&pixels, width, height).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: Encoding is lossless.
        #[test]
        fn prop_lossless(
            (width, height) in dimensions_strategy(),
        ) {
            let size = (width as usize) * (height as usize) * 4;
            let pixels: Vec<u8> = (0..size).map(|i| ((i * 37) % 256) as u8).collect();

            let png = encode_png(&pixels, width, height).unwrap();
            let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
            prop_assert_eq!(decoded.dimensions(), (width, height));
            prop_assert_eq!(decoded.into_raw(), pixels);
        }

        /// Property: Mismatched pixel data always returns an error.
        #[test]
        fn prop_invalid_pixel_length_returns_error(
            (width, height) in dimensions_strategy(),
            delta in -10i32..=10,
        ) {
            prop_assume!(delta != 0);
            let expected = (width as usize) * (height as usize) * 4;
            let actual = (expected as i64 + delta as i64).max(0) as usize;
            prop_assume!(actual != expected);

            let result = encode_png(&vec![0u8; actual], width, height);
            prop_assert!(
                matches!(result, Err(EncodeError::InvalidPixelData { .. })),
                "Mismatched pixel data should return InvalidPixelData"
            );
        }
    }
}
