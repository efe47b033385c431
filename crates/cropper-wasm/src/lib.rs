//! Cropper WASM - WebAssembly bindings for Cropper
//!
//! This crate exposes the cropper-core session and geometry helpers to
//! JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `session` - `JsCropSession`, the stateful crop selector
//! - `geometry` - Stateless rectangle helpers
//! - `types` - WASM-compatible wrapper types for rectangles and image data
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropSession } from '@cropper/wasm';
//!
//! await init();
//!
//! const session = new JsCropSession();
//! session.set_export_callback((bytes, filename) => download(bytes, filename));
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! if (session.select_file(file.type, bytes)) {
//!   img.onload = () => session.image_ready(img.offsetWidth, img.offsetHeight);
//! }
//! ```

use wasm_bindgen::prelude::*;

mod geometry;
mod session;
mod types;

// Re-export public types
pub use geometry::{clamp_rect, default_crop, to_source_space};
pub use session::JsCropSession;
pub use types::{JsCropRect, JsDecodedImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
