//! WASM bindings for the stateless geometry helpers.

use crate::types::JsCropRect;
use cropper_core::{geometry, CropRect, Dimensions};
use wasm_bindgen::prelude::*;

/// Centered square crop covering half the shorter displayed edge.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const rect = default_crop(200, 100); // { x: 75, y: 25, width: 50, height: 50 }
/// ```
#[wasm_bindgen]
pub fn default_crop(displayed_width: f64, displayed_height: f64) -> JsCropRect {
    geometry::default_crop(Dimensions::new(displayed_width, displayed_height)).into()
}

/// Clamp a rectangle into the displayed image (minimum size 10).
///
/// With `contained = false` the bounds for width/height are measured from
/// the unclamped x/y; with `contained = true` the result always fits.
#[wasm_bindgen]
pub fn clamp_rect(
    rect: &JsCropRect,
    displayed_width: f64,
    displayed_height: f64,
    contained: bool,
) -> JsCropRect {
    let displayed = Dimensions::new(displayed_width, displayed_height);
    let rect = CropRect::from(*rect);
    let clamped = if contained {
        geometry::clamp_contained(rect, displayed, geometry::MIN_SIZE)
    } else {
        geometry::clamp(rect, displayed)
    };
    clamped.into()
}

/// Map a displayed-space rectangle to natural pixel coordinates.
#[wasm_bindgen]
pub fn to_source_space(
    rect: &JsCropRect,
    natural_width: f64,
    natural_height: f64,
    displayed_width: f64,
    displayed_height: f64,
) -> JsCropRect {
    geometry::to_source_space(
        (*rect).into(),
        Dimensions::new(natural_width, natural_height),
        Dimensions::new(displayed_width, displayed_height),
    )
    .into()
}
