//! Cropper Core - interactive rectangular crop selection
//!
//! This crate provides the crop-geometry engine and the session that drives
//! it: loading an image, selecting a rectangle by pointer drag or numeric
//! fields, extracting the pixels under it at full resolution and handing the
//! encoded result to the host for export.
//!
//! # Module Structure
//!
//! - `geometry` - Pure rectangle math (default crop, clamp, space mapping)
//! - `selection` - Selection state machine driven by pointer and field events
//! - `extract` - Pixel extraction from the natural-resolution image
//! - `decode` / `encode` - Image source and PNG artifact encoding
//! - `session` - Orchestration, artifact lifecycle and export

pub mod decode;
pub mod encode;
pub mod extract;
pub mod geometry;
pub mod selection;
pub mod session;

pub use extract::{extract, ExtractError, Extraction};
pub use geometry::{
    clamp, clamp_contained, default_crop, to_source_space, ClampPolicy, CropRect, Dimensions,
    Point, MIN_SIZE,
};
pub use selection::{CropEvent, CropField, CropState};
pub use session::{ArtifactHandle, BlobHost, CropSession, CroppedArtifact};

/// Filename offered for the exported crop.
pub const EXPORT_FILENAME: &str = "cropped-image.png";

/// Session configuration.
///
/// Every field has a default, so a partial object (or none at all) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    /// Minimum crop width/height in displayed units (default 10)
    pub min_size: f64,
    /// Initial crop side as a fraction of the shorter displayed edge (default 0.5)
    pub default_crop_fraction: f64,
    /// Filename handed to the host on export
    pub export_filename: String,
    /// How edits are forced back inside the image
    pub clamp_policy: ClampPolicy,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            min_size: geometry::MIN_SIZE,
            default_crop_fraction: geometry::DEFAULT_CROP_FRACTION,
            export_filename: EXPORT_FILENAME.to_string(),
            clamp_policy: ClampPolicy::Reference,
        }
    }
}

impl CropperConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
