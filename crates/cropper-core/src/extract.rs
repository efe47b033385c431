//! Crop extraction.
//!
//! Turns a displayed-space crop rectangle into a natural-resolution pixel
//! buffer. The rectangle is mapped to source space with
//! [`to_source_space`](crate::geometry::to_source_space), an output buffer
//! of `round(width) x round(height)` pixels (at least 1x1) is allocated, and
//! each output pixel copies its nearest source pixel. Because the output size
//! already equals the source-space crop size, this is a straight copy for
//! integer-aligned rectangles.
//!
//! Samples that fall outside the source image are left fully transparent,
//! which is what a rectangle overhanging the image edge renders as on a
//! canvas. A rectangle dragged from far outside the image can map to an
//! output far larger than the source; such outputs are refused with
//! [`ExtractError::TooLarge`] instead of being allocated.

use thiserror::Error;

use crate::decode::{DecodedImage, CHANNELS};
use crate::encode::{encode_png, EncodeError};
use crate::geometry::{to_source_space, CropRect, Dimensions};

/// Largest output area, in pixels, that extraction will allocate.
pub const MAX_OUTPUT_PIXELS: u64 = 8192 * 8192;

/// Error types for extraction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The output buffer would exceed [`MAX_OUTPUT_PIXELS`].
    #[error("Crop output too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },
}

/// Result of one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Crop rectangle in natural-space pixel coordinates.
    pub source_rect: CropRect,
    /// Cropped pixels at natural resolution.
    pub image: DecodedImage,
}

impl Extraction {
    /// Encode the cropped pixels for export.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode_png(&self.image.pixels, self.image.width, self.image.height)
    }
}

/// Output size for a source-space rectangle: rounded, minimum 1x1.
pub fn output_size(source_rect: CropRect) -> (u32, u32) {
    let side = |v: f64| {
        if v.is_finite() && v >= 1.0 {
            v.round().min(u32::MAX as f64) as u32
        } else {
            1
        }
    };
    (side(source_rect.width), side(source_rect.height))
}

/// Extract the pixels under a displayed-space rectangle.
///
/// # Arguments
///
/// * `image` - Natural-resolution source image
/// * `rect` - Crop rectangle in displayed space
/// * `natural` - Natural size of `image`
/// * `displayed` - On-screen size the rectangle was drawn against
///
/// # Errors
///
/// Returns `ExtractError::TooLarge` if the output would exceed
/// [`MAX_OUTPUT_PIXELS`].
pub fn extract(
    image: &DecodedImage,
    rect: CropRect,
    natural: Dimensions,
    displayed: Dimensions,
) -> Result<Extraction, ExtractError> {
    let source_rect = to_source_space(rect, natural, displayed);
    Ok(Extraction {
        source_rect,
        image: copy_region(image, source_rect)?,
    })
}

/// Copy a source-space region into a new buffer sized by [`output_size`].
pub fn copy_region(
    image: &DecodedImage,
    source_rect: CropRect,
) -> Result<DecodedImage, ExtractError> {
    let (out_width, out_height) = output_size(source_rect);
    let too_large = ExtractError::TooLarge {
        width: out_width,
        height: out_height,
    };
    if u64::from(out_width) * u64::from(out_height) > MAX_OUTPUT_PIXELS {
        return Err(too_large);
    }
    let mut output = DecodedImage::transparent(out_width, out_height).ok_or(too_large)?;

    let step_x = source_rect.width.max(0.0) / out_width as f64;
    let step_y = source_rect.height.max(0.0) / out_height as f64;
    let src_stride = image.width as usize * CHANNELS;
    let dst_stride = out_width as usize * CHANNELS;

    // Column lookup shared by every row
    let columns: Vec<Option<usize>> = (0..out_width)
        .map(|i| sample_index(source_rect.x + (i as f64 + 0.5) * step_x, image.width))
        .collect();

    for j in 0..out_height {
        let Some(src_y) = sample_index(source_rect.y + (j as f64 + 0.5) * step_y, image.height)
        else {
            continue;
        };
        let src_row = src_y * src_stride;
        let dst_row = j as usize * dst_stride;

        for (i, column) in columns.iter().enumerate() {
            let Some(src_x) = *column else { continue };
            let src_idx = src_row + src_x * CHANNELS;
            let dst_idx = dst_row + i * CHANNELS;
            output.pixels[dst_idx..dst_idx + CHANNELS]
                .copy_from_slice(&image.pixels[src_idx..src_idx + CHANNELS]);
        }
    }

    Ok(output)
}

/// Source pixel index for a sample coordinate, if it lands inside `0..limit`.
#[inline]
fn sample_index(coord: f64, limit: u32) -> Option<usize> {
    let idx = coord.floor();
    if idx >= 0.0 && idx < limit as f64 {
        Some(idx as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_image;

    /// Create a test image where each pixel encodes its own position.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 0, 255]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn dims(w: f64, h: f64) -> Dimensions {
        Dimensions::new(w, h)
    }

    #[test]
    fn test_extract_scaled_region() {
        let img = test_image(400, 200);
        let result = extract(
            &img,
            CropRect::new(10.0, 10.0, 50.0, 20.0),
            dims(400.0, 200.0),
            dims(200.0, 100.0),
        )
        .unwrap();

        assert_eq!(result.source_rect, CropRect::new(20.0, 20.0, 100.0, 40.0));
        assert_eq!((result.image.width, result.image.height), (100, 40));
        assert_eq!(result.image.pixel(0, 0), Some([20, 20, 0, 255]));
        assert_eq!(result.image.pixel(99, 39), Some([119, 59, 0, 255]));
    }

    #[test]
    fn test_extract_unscaled_is_identity_copy() {
        let img = test_image(50, 50);
        let result = extract(
            &img,
            CropRect::new(0.0, 0.0, 50.0, 50.0),
            dims(50.0, 50.0),
            dims(50.0, 50.0),
        )
        .unwrap();
        assert_eq!(result.image, img);
    }

    #[test]
    fn test_output_size_rounds() {
        assert_eq!(output_size(CropRect::new(0.0, 0.0, 10.4, 10.5)), (10, 11));
    }

    #[test]
    fn test_output_size_minimum_one() {
        assert_eq!(output_size(CropRect::new(0.0, 0.0, 0.0, 0.2)), (1, 1));
        assert_eq!(output_size(CropRect::new(0.0, 0.0, f64::NAN, -3.0)), (1, 1));
    }

    #[test]
    fn test_overhang_is_transparent() {
        let img = test_image(10, 10);
        // Reference clamp can leave a rectangle hanging off the right edge
        let result = copy_region(&img, CropRect::new(5.0, 0.0, 10.0, 10.0)).unwrap();

        assert_eq!(result.width, 10);
        assert_eq!(result.pixel(4, 0), Some([9, 0, 0, 255]));
        assert_eq!(result.pixel(5, 0), Some([0, 0, 0, 0]));
        assert_eq!(result.pixel(9, 9), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_negative_origin_is_transparent() {
        let img = test_image(10, 10);
        let result = copy_region(&img, CropRect::new(-2.0, -2.0, 4.0, 4.0)).unwrap();
        assert_eq!(result.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(result.pixel(2, 2), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_fractional_scale_samples_nearest() {
        let img = test_image(30, 30);
        // 3x downscaled display; rect {1, 1, 5, 5} -> source {3, 3, 15, 15}
        let result = extract(
            &img,
            CropRect::new(1.0, 1.0, 5.0, 5.0),
            dims(30.0, 30.0),
            dims(10.0, 10.0),
        )
        .unwrap();
        assert_eq!((result.image.width, result.image.height), (15, 15));
        assert_eq!(result.image.pixel(0, 0), Some([3, 3, 0, 255]));
        assert_eq!(result.image.pixel(14, 14), Some([17, 17, 0, 255]));
    }

    #[test]
    fn test_encode_roundtrips_pixels() {
        let img = test_image(20, 20);
        let result = extract(
            &img,
            CropRect::new(2.0, 3.0, 8.0, 6.0),
            dims(20.0, 20.0),
            dims(20.0, 20.0),
        )
        .unwrap();
        let png = result.encode().unwrap();
        assert_eq!(decode_image(&png).unwrap(), result.image);
    }

    #[test]
    fn test_oversized_output_is_refused() {
        let img = test_image(10, 10);
        let result = copy_region(&img, CropRect::new(-1e10, -1e10, 2e10, 2e10));
        assert_eq!(
            result,
            Err(ExtractError::TooLarge {
                width: u32::MAX,
                height: u32::MAX,
            })
        );
    }

    #[test]
    fn test_output_at_area_limit_is_allowed() {
        let img = test_image(4, 4);
        assert!(copy_region(&img, CropRect::new(0.0, 0.0, 8192.0, 1.0)).is_ok());
        assert!(matches!(
            copy_region(&img, CropRect::new(0.0, 0.0, 8193.0, 8192.0)),
            Err(ExtractError::TooLarge { .. })
        ));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn create_test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    /// Natural size, displayed size (downscaled by an integer-ish factor) and
    /// a rectangle inside the displayed image.
    fn scenario_strategy() -> impl Strategy<Value = (u32, u32, Dimensions, CropRect)> {
        (8u32..=80, 8u32..=80, 1.0f64..=4.0).prop_flat_map(|(w, h, factor)| {
            let displayed = Dimensions::new(w as f64 / factor, h as f64 / factor);
            (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(
                move |(fx, fy, fw, fh)| {
                    let width = fw * displayed.width;
                    let height = fh * displayed.height;
                    let rect = CropRect::new(
                        fx * (displayed.width - width),
                        fy * (displayed.height - height),
                        width,
                        height,
                    );
                    (w, h, displayed, rect)
                },
            )
        })
    }

    proptest! {
        /// Property: Output is never smaller than 1x1 and matches the rounded source size.
        #[test]
        fn prop_output_dimensions(
            (w, h, displayed, rect) in scenario_strategy(),
        ) {
            let img = create_test_image(w, h);
            let natural = img.dimensions();
            let result = extract(&img, rect, natural, displayed).unwrap();

            prop_assert!(result.image.width >= 1 && result.image.height >= 1);
            prop_assert_eq!(
                (result.image.width, result.image.height),
                output_size(result.source_rect)
            );
            prop_assert_eq!(
                result.image.pixels.len(),
                (result.image.width * result.image.height * 4) as usize
            );
        }

        /// Property: Extraction is deterministic.
        #[test]
        fn prop_extract_is_deterministic(
            (w, h, displayed, rect) in scenario_strategy(),
        ) {
            let img = create_test_image(w, h);
            let natural = img.dimensions();

            let first = extract(&img, rect, natural, displayed).unwrap();
            let second = extract(&img, rect, natural, displayed).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.encode().unwrap(), second.encode().unwrap());
        }

        /// Property: Integer-aligned unscaled crops copy pixels exactly.
        #[test]
        fn prop_aligned_crop_copies_exactly(
            (w, h) in (10u32..=60, 10u32..=60),
            (fx, fy, fw, fh) in (0.0f64..=1.0, 0.0f64..=1.0, 0.1f64..=1.0, 0.1f64..=1.0),
        ) {
            let img = create_test_image(w, h);
            let cw = ((fw * w as f64) as u32).max(1);
            let ch = ((fh * h as f64) as u32).max(1);
            let cx = (fx * (w - cw) as f64) as u32;
            let cy = (fy * (h - ch) as f64) as u32;

            let out = copy_region(&img, CropRect::new(cx as f64, cy as f64, cw as f64, ch as f64))
                .unwrap();
            prop_assert_eq!((out.width, out.height), (cw, ch));
            for y in 0..ch {
                for x in 0..cw {
                    prop_assert_eq!(out.pixel(x, y), img.pixel(cx + x, cy + y));
                }
            }
        }
    }
}
