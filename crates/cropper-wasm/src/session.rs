//! WASM bindings for the crop session.
//!
//! `JsCropSession` wraps the core session with a host that keeps published
//! PNG bytes in WASM memory and forwards exports to a JavaScript callback.
//! Decoding and encoding run synchronously inside each call, so by the time
//! a method returns the artifact (if any) is already committed.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const session = new JsCropSession();
//! container.onmousedown = (e) => session.pointer_down(e.offsetX, e.offsetY);
//! container.onmousemove = (e) => session.pointer_move(e.offsetX, e.offsetY);
//! container.onmouseup = () => session.pointer_up();
//! container.onmouseleave = () => session.pointer_leave();
//! widthInput.oninput = (e) => session.set_field("width", e.target.value);
//! ```

use std::collections::HashMap;

use crate::types::{JsCropRect, JsDecodedImage};
use cropper_core::selection::CropField;
use cropper_core::session::{ArtifactHandle, BlobHost, CropSession, DecodeOutcome, EncodeJob};
use cropper_core::{CropperConfig, Dimensions, Point};
use wasm_bindgen::prelude::*;

/// Keeps published artifacts in memory until revoked.
#[derive(Default)]
struct MemoryHost {
    next: u64,
    blobs: HashMap<ArtifactHandle, Vec<u8>>,
    on_export: Option<js_sys::Function>,
}

impl BlobHost for MemoryHost {
    fn publish(&mut self, png: &[u8]) -> ArtifactHandle {
        self.next += 1;
        let handle = ArtifactHandle(self.next);
        self.blobs.insert(handle, png.to_vec());
        handle
    }

    fn revoke(&mut self, handle: ArtifactHandle) {
        self.blobs.remove(&handle);
    }

    fn save(&mut self, handle: ArtifactHandle, filename: &str) {
        let (Some(callback), Some(bytes)) = (&self.on_export, self.blobs.get(&handle)) else {
            return;
        };
        let array = js_sys::Uint8Array::from(bytes.as_slice());
        let result = callback.call2(&JsValue::NULL, &array, &JsValue::from_str(filename));
        if let Err(exception) = result {
            report_export_failure(&exception);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn report_export_failure(exception: &JsValue) {
    web_sys::console::warn_2(&JsValue::from_str("Export callback threw:"), exception);
}

#[cfg(not(target_arch = "wasm32"))]
fn report_export_failure(_exception: &JsValue) {}

/// Interactive crop selector for one image at a time.
#[wasm_bindgen]
pub struct JsCropSession {
    inner: CropSession<MemoryHost>,
    decoded: Option<DecodeOutcome>,
}

impl Default for JsCropSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JsCropSession {
    /// Create a session with the default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsCropSession {
        Self::from_config(CropperConfig::default())
    }

    /// Create a session from a plain configuration object, e.g.
    /// `{ min_size: 20, clamp_policy: "contained" }`. Missing keys use defaults.
    pub fn with_config(config: JsValue) -> Result<JsCropSession, JsValue> {
        let config: CropperConfig = if config.is_undefined() || config.is_null() {
            CropperConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(Self::from_config(config))
    }

    /// Register `(bytes: Uint8Array, filename: string) => void`, called on export.
    pub fn set_export_callback(&mut self, callback: js_sys::Function) {
        self.inner.host_mut().on_export = Some(callback);
    }

    /// Accept a selected file. Returns `false` for non-image MIME types.
    ///
    /// The file is decoded immediately; call `image_ready` once the host's
    /// `<img>` has been laid out and its displayed size is known.
    pub fn select_file(&mut self, mime: &str, bytes: Vec<u8>) -> bool {
        match self.inner.select_file(mime, bytes) {
            Some(job) => {
                self.decoded = Some(job.run());
                true
            }
            None => false,
        }
    }

    /// Natural width of the selected file, once decoded successfully.
    pub fn decoded_width(&self) -> Option<u32> {
        self.decoded
            .as_ref()
            .and_then(|d| d.result.as_ref().ok())
            .map(|img| img.width)
    }

    /// Natural height of the selected file, once decoded successfully.
    pub fn decoded_height(&self) -> Option<u32> {
        self.decoded
            .as_ref()
            .and_then(|d| d.result.as_ref().ok())
            .map(|img| img.height)
    }

    /// Finish loading with the on-screen size. Returns `true` if the image
    /// was loaded.
    pub fn image_ready(&mut self, displayed_width: f64, displayed_height: f64) -> bool {
        let Some(outcome) = self.decoded.take() else {
            return false;
        };
        let job = self
            .inner
            .image_ready(outcome, Dimensions::new(displayed_width, displayed_height));
        self.settle(job);
        self.inner.has_image()
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let job = self.inner.pointer_down(Point::new(x, y));
        self.settle(job);
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let job = self.inner.pointer_move(Point::new(x, y));
        self.settle(job);
    }

    pub fn pointer_up(&mut self) {
        let job = self.inner.pointer_up();
        self.settle(job);
    }

    pub fn pointer_leave(&mut self) {
        let job = self.inner.pointer_leave();
        self.settle(job);
    }

    /// Apply a numeric field edit; `field` is `"x"`, `"y"`, `"width"` or
    /// `"height"`. Unknown field names are ignored.
    pub fn set_field(&mut self, field: &str, value: &str) {
        let Some(field) = CropField::from_name(field) else {
            return;
        };
        let job = self.inner.set_field(field, value);
        self.settle(job);
    }

    /// Log the selection and re-run extraction. Returns the natural-space
    /// rectangle, or `undefined` without an image.
    pub fn apply(&mut self) -> Option<JsCropRect> {
        let applied = self.inner.apply()?;
        #[cfg(target_arch = "wasm32")]
        {
            let report = &applied.report;
            web_sys::console::log_1(&JsValue::from_str(&format!(
                "Crop coordinates: {:?}; natural: {}x{}; displayed: {}x{}",
                report.rect,
                report.natural.width,
                report.natural.height,
                report.displayed.width,
                report.displayed.height
            )));
        }
        let source = applied.report.source_rect;
        self.settle(applied.job);
        Some(source.into())
    }

    /// Send the current artifact to the export callback. Returns `false`
    /// when there is nothing to export.
    pub fn export(&mut self) -> bool {
        self.inner.export()
    }

    /// Current rectangle in displayed space.
    pub fn rect(&self) -> Option<JsCropRect> {
        self.inner.rect().map(JsCropRect::from)
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.inner.has_image()
    }

    /// Latest cropped pixels for a canvas preview.
    pub fn preview(&self) -> Option<JsDecodedImage> {
        self.inner
            .preview()
            .map(|extraction| JsDecodedImage::from_decoded(&extraction.image))
    }

    /// PNG bytes of the committed artifact.
    pub fn artifact_png(&self) -> Option<Vec<u8>> {
        self.inner.artifact().map(|artifact| artifact.png.clone())
    }

    /// Number of artifacts the host is still holding.
    #[wasm_bindgen(getter)]
    pub fn live_artifacts(&self) -> usize {
        self.inner.host().blobs.len()
    }
}

impl JsCropSession {
    fn from_config(config: CropperConfig) -> Self {
        Self {
            inner: CropSession::with_config(MemoryHost::default(), config),
            decoded: None,
        }
    }

    fn settle(&mut self, job: Option<EncodeJob>) {
        if let Some(job) = job {
            self.inner.encode_now(job);
        }
    }
}
