//! Artifact encoding for export.
//!
//! Cropped artifacts are always written losslessly, so running the same
//! extraction twice yields byte-identical files.
//!
//! # Examples
//!
//! ```ignore
//! use cropper_core::encode::encode_png;
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray, opaque
//! let png_bytes = encode_png(&pixels, 100, 100).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod png;

pub use png::{encode_png, EncodeError, PNG_SIGNATURE};
