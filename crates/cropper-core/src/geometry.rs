//! Crop rectangle geometry.
//!
//! Pure functions for deriving, constraining and converting crop rectangles.
//! Nothing in this module holds state; every function takes its inputs by
//! value and returns a new rectangle.
//!
//! # Coordinate Spaces
//!
//! - **Displayed space**: coordinates of the image as rendered on screen,
//!   origin top-left. All `CropRect` values produced by the selection state
//!   machine live here.
//! - **Natural space**: full-resolution pixel coordinates of the decoded
//!   image. Only [`to_source_space`] produces rectangles in this space.

use serde::{Deserialize, Serialize};

/// Minimum width and height of an active crop rectangle, in displayed units.
pub const MIN_SIZE: f64 = 10.0;

/// Fraction of the shorter displayed edge used for the initial crop square.
pub const DEFAULT_CROP_FRACTION: f64 = 0.5;

/// Width and height of an image, either natural or displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Dimensions of a pixel buffer.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }

    /// True when either axis is zero (or negative), i.e. nothing can be measured.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A pointer position in displayed space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned crop rectangle, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero-area rectangle anchored at a point.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when both width and height are positive.
    ///
    /// Extraction and the on-screen overlay are gated on this.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Check that the rectangle lies within `bounds` and meets `min_size`.
    pub fn fits_within(&self, bounds: Dimensions, min_size: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= bounds.width
            && self.bottom() <= bounds.height
            && self.width >= min_size
            && self.height >= min_size
    }
}

/// How a candidate rectangle is forced back into the displayed image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampPolicy {
    /// All four outputs are computed independently from the unclamped input.
    ///
    /// Width and height are bounded by the distance from the *input* x/y to
    /// the far edge, so a rectangle that starts off-image, or a tiny one near
    /// the far edge lifted to the minimum size, can still overhang the image.
    #[default]
    Reference,
    /// Size is clamped first, then position, so the result always fits.
    Contained,
}

/// Centered square crop covering half of the shorter displayed edge.
pub fn default_crop(displayed: Dimensions) -> CropRect {
    default_crop_with_fraction(displayed, DEFAULT_CROP_FRACTION)
}

/// Centered square crop whose side is `fraction * min(width, height)`.
pub fn default_crop_with_fraction(displayed: Dimensions, fraction: f64) -> CropRect {
    let side = displayed.width.min(displayed.height) * fraction;
    CropRect {
        x: (displayed.width - side) / 2.0,
        y: (displayed.height - side) / 2.0,
        width: side,
        height: side,
    }
}

/// Clamp a rectangle into the displayed image using the reference policy
/// and [`MIN_SIZE`].
///
/// ```text
/// x'      = max(0, min(D.width  - rect.width,  rect.x))
/// y'      = max(0, min(D.height - rect.height, rect.y))
/// width'  = max(MIN_SIZE, min(D.width  - rect.x, rect.width))
/// height' = max(MIN_SIZE, min(D.height - rect.y, rect.height))
/// ```
///
/// Every term reads the input rectangle, never a value clamped in the same
/// call. When an upper bound falls below the lower bound the lower bound wins.
pub fn clamp(rect: CropRect, displayed: Dimensions) -> CropRect {
    clamp_reference(rect, displayed, MIN_SIZE)
}

/// Clamp with an explicit policy and minimum size.
pub fn clamp_with(
    policy: ClampPolicy,
    rect: CropRect,
    displayed: Dimensions,
    min_size: f64,
) -> CropRect {
    match policy {
        ClampPolicy::Reference => clamp_reference(rect, displayed, min_size),
        ClampPolicy::Contained => clamp_contained(rect, displayed, min_size),
    }
}

fn clamp_reference(rect: CropRect, displayed: Dimensions, min_size: f64) -> CropRect {
    CropRect {
        x: bounded(rect.x, 0.0, displayed.width - rect.width),
        y: bounded(rect.y, 0.0, displayed.height - rect.height),
        width: bounded(rect.width, min_size, displayed.width - rect.x),
        height: bounded(rect.height, min_size, displayed.height - rect.y),
    }
}

/// Clamp so the result always lies inside `displayed`.
///
/// Size is limited to `[min(min_size, D), D]` first; position is then limited
/// to `[0, D - size]`. If the image is smaller than `min_size` on an axis the
/// rectangle spans that whole axis.
pub fn clamp_contained(rect: CropRect, displayed: Dimensions, min_size: f64) -> CropRect {
    let (x, width) = contain_axis(rect.x, rect.width, displayed.width, min_size);
    let (y, height) = contain_axis(rect.y, rect.height, displayed.height, min_size);
    CropRect {
        x,
        y,
        width,
        height,
    }
}

fn contain_axis(start: f64, len: f64, extent: f64, min_size: f64) -> (f64, f64) {
    let extent = extent.max(0.0);
    let len = bounded(len, min_size.min(extent), extent);
    let start = bounded(start, 0.0, extent - len);
    (start, len)
}

/// `max(lo, min(hi, value))`. Unlike `f64::clamp` this never panics when
/// `hi < lo`; `lo` wins.
#[inline]
fn bounded(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}

/// Ratio of natural to displayed size along each axis.
///
/// A zero displayed axis yields a scale of 0 rather than infinity.
pub fn scale_factors(natural: Dimensions, displayed: Dimensions) -> (f64, f64) {
    let ratio = |n: f64, d: f64| if d > 0.0 { n / d } else { 0.0 };
    (
        ratio(natural.width, displayed.width),
        ratio(natural.height, displayed.height),
    )
}

/// Map a displayed-space rectangle to natural-space pixel coordinates.
///
/// `x` and `width` use the horizontal scale, `y` and `height` the vertical one.
pub fn to_source_space(rect: CropRect, natural: Dimensions, displayed: Dimensions) -> CropRect {
    let (sx, sy) = scale_factors(natural, displayed);
    CropRect {
        x: rect.x * sx,
        y: rect.y * sy,
        width: rect.width * sx,
        height: rect.height * sy,
    }
}

/// Rectangle spanned by a drag from `anchor` to `current`, in either direction.
pub fn rect_from_drag(anchor: Point, current: Point) -> CropRect {
    CropRect {
        x: anchor.x.min(current.x),
        y: anchor.y.min(current.y),
        width: (current.x - anchor.x).abs(),
        height: (current.y - anchor.y).abs(),
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
