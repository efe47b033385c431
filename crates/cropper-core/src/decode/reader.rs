//! Format-sniffing decode with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage, Orientation};

/// Decode image bytes of any enabled format, applying EXIF orientation.
///
/// The result has the dimensions a browser shows, so a portrait photo
/// stored sideways with an orientation tag decodes as portrait.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized.
/// Returns `DecodeError::CorruptedFile` if decoding fails part way.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = extract_orientation(bytes);
    let img = read_dynamic(bytes)?;
    let oriented = apply_orientation(img, orientation);
    Ok(DecodedImage::from_rgba_image(oriented.into_rgba8()))
}

fn read_dynamic(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))
}

/// Returns `Orientation::Normal` when the bytes carry no readable EXIF block.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    // Only containers kamadak-exif understands; GIF/BMP report Normal.
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff) => {}
        _ => return Orientation::Normal,
    }

    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_png;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ExtendedColorType, RgbaImage};

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[x as u8, y as u8, 7, 255]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    fn dynamic(img: &DecodedImage) -> DynamicImage {
        DynamicImage::ImageRgba8(
            RgbaImage::from_raw(img.width, img.height, img.pixels.clone()).unwrap(),
        )
    }

    /// Big-endian TIFF block holding a single Orientation entry.
    fn tiff_orientation(value: u16) -> Vec<u8> {
        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&1u16.to_be_bytes()); // entry count
        tiff.extend_from_slice(&0x0112u16.to_be_bytes()); // Orientation
        tiff.extend_from_slice(&3u16.to_be_bytes()); // SHORT
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&value.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD
        tiff
    }

    /// JPEG with a red left half and a blue right half, optionally tagged
    /// with an APP1 EXIF orientation.
    fn jpeg(width: u32, height: u32, orientation: Option<u16>) -> Vec<u8> {
        let rgb: Vec<u8> = (0..height)
            .flat_map(|_| {
                (0..width).flat_map(move |x| {
                    if x < width / 2 {
                        [255u8, 0, 0]
                    } else {
                        [0u8, 0, 255]
                    }
                })
            })
            .collect();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, 95)
            .encode(&rgb, width, height, ExtendedColorType::Rgb8)
            .unwrap();

        if let Some(value) = orientation {
            let mut payload = b"Exif\x00\x00".to_vec();
            payload.extend(tiff_orientation(value));
            let mut segment = vec![0xFF, 0xE1];
            segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
            segment.extend(payload);
            // Right after SOI
            let mut tagged = bytes[..2].to_vec();
            tagged.extend(segment);
            tagged.extend_from_slice(&bytes[2..]);
            return tagged;
        }
        bytes
    }

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &b in bytes {
            crc ^= u32::from(b);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    /// PNG of `img` carrying an `eXIf` chunk with the given orientation.
    fn png_with_orientation(img: &DecodedImage, value: u16) -> Vec<u8> {
        let png = encode_png(&img.pixels, img.width, img.height).unwrap();
        let mut body = b"eXIf".to_vec();
        body.extend(tiff_orientation(value));

        let mut chunk = ((body.len() - 4) as u32).to_be_bytes().to_vec();
        chunk.extend_from_slice(&body);
        chunk.extend_from_slice(&crc32(&body).to_be_bytes());
        // Signature (8) + IHDR chunk (25)
        let mut tagged = png[..33].to_vec();
        tagged.extend(chunk);
        tagged.extend_from_slice(&png[33..]);
        tagged
    }

    #[test]
    fn test_decode_png_roundtrip_is_lossless() {
        let original = gradient(12, 7);
        let png = encode_png(&original.pixels, 12, 7).unwrap();

        let decoded = decode_image(&png).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_png_has_normal_orientation() {
        let png = encode_png(&gradient(2, 2).pixels, 2, 2).unwrap();
        assert_eq!(extract_orientation(&png), Orientation::Normal);
    }

    #[test]
    fn test_decode_jpeg_without_exif_keeps_dimensions() {
        let bytes = jpeg(32, 16, None);
        assert_eq!(extract_orientation(&bytes), Orientation::Normal);

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (32, 16));
    }

    #[test]
    fn test_decode_jpeg_rotate90_swaps_dimensions() {
        let bytes = jpeg(32, 16, Some(6));
        assert_eq!(extract_orientation(&bytes), Orientation::Rotate90CW);

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (16, 32));
        assert_eq!(decoded.dimensions().width, 16.0);

        // The red left half is now the top half
        let top = decoded.pixel(8, 4).unwrap();
        let bottom = decoded.pixel(8, 27).unwrap();
        assert!(top[0] > top[2], "top should be red: {:?}", top);
        assert!(bottom[2] > bottom[0], "bottom should be blue: {:?}", bottom);
    }

    #[test]
    fn test_decode_png_exif_orientation_is_applied() {
        let original = gradient(4, 2);
        let png = png_with_orientation(&original, 6);
        assert_eq!(extract_orientation(&png), Orientation::Rotate90CW);

        let decoded = decode_image(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 4));
        // Rotating clockwise brings the bottom-left source pixel to the top-left
        assert_eq!(decoded.pixel(0, 0), Some([0, 1, 7, 255]));
        assert_eq!(decoded.pixel(1, 0), Some([0, 0, 7, 255]));
    }

    #[test]
    fn test_decode_garbage_is_invalid_format() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png_is_corrupted() {
        let png = encode_png(&gradient(16, 16).pixels, 16, 16).unwrap();
        let result = decode_image(&png[..png.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_decode_empty_is_error() {
        assert!(decode_image(&[]).is_err());
    }

    #[test]
    fn test_apply_orientation_rotate_swaps_dimensions() {
        let rotated = apply_orientation(dynamic(&gradient(4, 2)), Orientation::Rotate90CW);
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
    }

    #[test]
    fn test_apply_orientation_flip_keeps_dimensions() {
        let flipped = apply_orientation(dynamic(&gradient(4, 2)), Orientation::FlipHorizontal);
        assert_eq!((flipped.width(), flipped.height()), (4, 2));
        // Top-left now holds what was top-right (x = 3)
        assert_eq!(flipped.to_rgba8().get_pixel(0, 0).0[0], 3);
    }
}
