//! Image source: MIME screening and decoding of user-selected files.
//!
//! This module provides functionality for:
//! - Rejecting non-image selections before any work is done
//! - Decoding any format the `image` crate is built with (JPEG, PNG, GIF,
//!   WebP, BMP) into an RGBA buffer
//! - Applying EXIF orientation so natural dimensions match what a browser
//!   reports for the same file
//!
//! # Examples
//!
//! ```ignore
//! use cropper_core::decode::{accepts_mime, decode_image};
//!
//! if accepts_mime("image/png") {
//!     let image = decode_image(&bytes)?;
//!     println!("Decoded {}x{} image", image.width, image.height);
//! }
//! ```

mod reader;
mod types;

pub use reader::decode_image;
pub use types::{accepts_mime, buffer_len, DecodeError, DecodedImage, Orientation, CHANNELS};
