//! WASM-compatible wrapper types.
//!
//! These wrap the core rectangle and image types and handle the conversion
//! between Rust and JavaScript data representations.

use cropper_core::decode::DecodedImage;
use cropper_core::CropRect;
use wasm_bindgen::prelude::*;

/// A crop rectangle for JavaScript.
///
/// Fields are plain numbers; wasm-bindgen generates getters and setters.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsCropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[wasm_bindgen]
impl JsCropRect {
    #[wasm_bindgen(constructor)]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> JsCropRect {
        JsCropRect {
            x,
            y,
            width,
            height,
        }
    }

    /// True when both width and height are positive (the overlay is drawn).
    pub fn has_area(&self) -> bool {
        CropRect::from(*self).has_area()
    }
}

impl From<CropRect> for JsCropRect {
    fn from(rect: CropRect) -> Self {
        JsCropRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

impl From<JsCropRect> for CropRect {
    fn from(rect: JsCropRect) -> Self {
        CropRect::new(rect.x, rect.y, rect.width, rect.height)
    }
}

/// A decoded RGBA image for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. `pixels()` copies it into a
/// `Uint8Array`, which can be wrapped in an `ImageData` for a canvas preview.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: &DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels.clone(),
        }
    }
}
