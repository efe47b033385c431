//! Crop session: image lifecycle, extraction triggering and artifact commits.
//!
//! The session is the only owner of the loaded image, the selection state and
//! the committed artifact. Decoding and encoding are handed to the host as job
//! values ([`DecodeJob`], [`EncodeJob`]); the host runs them whenever it
//! likes, in any order, and reports the outcome back.
//!
//! # Sequencing
//!
//! Every job carries a sequence number from one monotonic counter. The
//! session keeps a floor: loading an image raises it past every job issued
//! so far, and committing an artifact raises it to that artifact's sequence.
//! An outcome at or below the floor is discarded, so neither a previous
//! image's crop nor an older rectangle can replace a newer artifact.
//!
//! # Failure
//!
//! Nothing here returns an error to the caller. Non-image files, failed
//! decodes, refused extractions and failed encodes are logged and leave
//! "no artifact" behind.

use tracing::{debug, info, warn};

use crate::decode::{accepts_mime, decode_image, DecodeError, DecodedImage};
use crate::encode::EncodeError;
use crate::extract::{extract, Extraction};
use crate::geometry::{CropRect, Dimensions, Point};
use crate::selection::{CropEvent, CropField, CropState, Frame, SelectionRules};
use crate::CropperConfig;

/// Opaque host-side reference to a published artifact (e.g. an object URL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactHandle(pub u64);

/// Host services for publishing, releasing and saving encoded artifacts.
pub trait BlobHost {
    /// Make encoded bytes available for display/download.
    fn publish(&mut self, png: &[u8]) -> ArtifactHandle;
    /// Release a handle that is no longer referenced.
    fn revoke(&mut self, handle: ArtifactHandle);
    /// Trigger a user-facing save of a published artifact.
    fn save(&mut self, handle: ArtifactHandle, filename: &str);
}

/// A committed crop: pixels, their PNG encoding and the host handle.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedArtifact {
    pub sequence: u64,
    /// Displayed-space rectangle the crop was taken from.
    pub rect: CropRect,
    pub extraction: Extraction,
    pub png: Vec<u8>,
    pub handle: ArtifactHandle,
}

/// Pending decode of a selected file.
#[derive(Debug, Clone)]
pub struct DecodeJob {
    pub sequence: u64,
    pub bytes: Vec<u8>,
}

impl DecodeJob {
    pub fn run(self) -> DecodeOutcome {
        DecodeOutcome {
            sequence: self.sequence,
            result: decode_image(&self.bytes),
        }
    }
}

#[derive(Debug)]
pub struct DecodeOutcome {
    pub sequence: u64,
    pub result: Result<DecodedImage, DecodeError>,
}

/// Pending PNG encode of an extraction.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub sequence: u64,
    pub rect: CropRect,
    pub extraction: Extraction,
}

impl EncodeJob {
    pub fn run(self) -> EncodeOutcome {
        let result = self.extraction.encode();
        EncodeOutcome {
            sequence: self.sequence,
            rect: self.rect,
            extraction: self.extraction,
            result,
        }
    }
}

#[derive(Debug)]
pub struct EncodeOutcome {
    pub sequence: u64,
    pub rect: CropRect,
    pub extraction: Extraction,
    pub result: Result<Vec<u8>, EncodeError>,
}

/// Diagnostic snapshot produced by [`CropSession::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplyReport {
    pub rect: CropRect,
    pub source_rect: CropRect,
    pub natural: Dimensions,
    pub displayed: Dimensions,
}

/// Result of an explicit apply: the report plus the forced extraction.
#[derive(Debug, Clone)]
pub struct Applied {
    pub report: ApplyReport,
    pub job: Option<EncodeJob>,
}

/// Rounded values shown in the numeric fields and selection info panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionInfo {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub image_width: i64,
    pub image_height: i64,
}

/// Orchestrates selection, extraction and export for one image at a time.
pub struct CropSession<H: BlobHost> {
    config: CropperConfig,
    rules: SelectionRules,
    host: H,
    state: CropState,
    image: Option<DecodedImage>,
    preview: Option<Extraction>,
    artifact: Option<CroppedArtifact>,
    pending_decode: Option<u64>,
    last_sequence: u64,
    floor: u64,
}

impl<H: BlobHost> CropSession<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, CropperConfig::default())
    }

    pub fn with_config(host: H, config: CropperConfig) -> Self {
        Self {
            rules: SelectionRules::from(&config),
            config,
            host,
            state: CropState::Idle,
            image: None,
            preview: None,
            artifact: None,
            pending_decode: None,
            last_sequence: 0,
            floor: 0,
        }
    }

    // ------------------------------------------------------------------
    // Image lifecycle
    // ------------------------------------------------------------------

    /// Accept a user-selected file.
    ///
    /// Files whose MIME type is not `image/*` are ignored and leave the
    /// session untouched. Otherwise all state for the previous image is
    /// dropped and a decode job is returned.
    pub fn select_file(&mut self, mime: &str, bytes: Vec<u8>) -> Option<DecodeJob> {
        if !accepts_mime(mime) {
            debug!(mime, "ignoring non-image selection");
            return None;
        }

        self.reset();
        let sequence = self.next_sequence();
        self.pending_decode = Some(sequence);
        debug!(sequence, mime, "issued decode job");
        Some(DecodeJob { sequence, bytes })
    }

    /// The selected file finished decoding and the host measured its
    /// on-screen size.
    ///
    /// Outcomes for a superseded selection and failed decodes are dropped.
    pub fn image_ready(
        &mut self,
        outcome: DecodeOutcome,
        displayed: Dimensions,
    ) -> Option<EncodeJob> {
        if self.pending_decode != Some(outcome.sequence) {
            debug!(sequence = outcome.sequence, "discarding stale decode");
            return None;
        }
        self.pending_decode = None;

        match outcome.result {
            Ok(image) => self.load_image(image, displayed),
            Err(e) => {
                warn!(error = %e, "image decode failed");
                None
            }
        }
    }

    /// Load an already decoded image, replacing any previous one.
    pub fn load_image(&mut self, image: DecodedImage, displayed: Dimensions) -> Option<EncodeJob> {
        self.reset();
        let natural = image.dimensions();
        info!(
            natural_width = natural.width,
            natural_height = natural.height,
            displayed_width = displayed.width,
            displayed_height = displayed.height,
            "image loaded"
        );
        self.image = Some(image);
        self.transition(CropEvent::Load { natural, displayed })
    }

    fn reset(&mut self) {
        self.release_artifact();
        self.image = None;
        self.preview = None;
        self.pending_decode = None;
        self.state = CropState::Idle;
        self.floor = self.last_sequence;
    }

    // ------------------------------------------------------------------
    // Selection events
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, point: Point) -> Option<EncodeJob> {
        self.transition(CropEvent::PointerDown(point))
    }

    pub fn pointer_move(&mut self, point: Point) -> Option<EncodeJob> {
        self.transition(CropEvent::PointerMove(point))
    }

    pub fn pointer_up(&mut self) -> Option<EncodeJob> {
        self.transition(CropEvent::PointerUp)
    }

    pub fn pointer_leave(&mut self) -> Option<EncodeJob> {
        self.transition(CropEvent::PointerLeave)
    }

    pub fn set_field(&mut self, field: CropField, text: &str) -> Option<EncodeJob> {
        self.transition(CropEvent::SetField(field, text.to_string()))
    }

    /// Feed one event to the state machine; extract if the rectangle changed
    /// and has area.
    pub fn transition(&mut self, event: CropEvent) -> Option<EncodeJob> {
        let before = self.state.rect();
        self.state = std::mem::take(&mut self.state).apply(event, &self.rules);
        let after = self.state.rect();

        match after {
            Some(rect) if after != before && rect.has_area() => self.extract_current(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Extraction and artifacts
    // ------------------------------------------------------------------

    /// Log the current selection and force an extraction.
    ///
    /// Returns `None` when no image is loaded.
    pub fn apply(&mut self) -> Option<Applied> {
        let rect = self.state.rect()?;
        let Frame { natural, displayed } = self.state.frame()?;
        let source_rect = crate::geometry::to_source_space(rect, natural, displayed);

        info!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            natural_width = natural.width,
            natural_height = natural.height,
            displayed_width = displayed.width,
            displayed_height = displayed.height,
            "crop applied"
        );

        Some(Applied {
            report: ApplyReport {
                rect,
                source_rect,
                natural,
                displayed,
            },
            job: self.extract_current(),
        })
    }

    fn extract_current(&mut self) -> Option<EncodeJob> {
        let image = self.image.as_ref()?;
        let rect = self.state.rect().filter(CropRect::has_area)?;
        let frame = self.state.frame()?;

        let extracted = extract(image, rect, frame.natural, frame.displayed);
        let sequence = self.next_sequence();
        let extraction = match extracted {
            Ok(extraction) => extraction,
            Err(e) => {
                // Nothing issued before this rectangle may commit either
                warn!(sequence, error = %e, "crop extraction failed");
                self.floor = sequence;
                self.preview = None;
                self.release_artifact();
                return None;
            }
        };
        self.preview = Some(extraction.clone());

        debug!(
            sequence,
            width = extraction.image.width,
            height = extraction.image.height,
            "issued encode job"
        );
        Some(EncodeJob {
            sequence,
            rect,
            extraction,
        })
    }

    /// Commit an encode outcome if nothing newer has been committed since
    /// and it belongs to the current image. Returns whether it was committed.
    pub fn finish_encoding(&mut self, outcome: EncodeOutcome) -> bool {
        if outcome.sequence <= self.floor {
            debug!(
                sequence = outcome.sequence,
                floor = self.floor,
                "discarding stale encode"
            );
            return false;
        }
        self.floor = outcome.sequence;

        match outcome.result {
            Ok(png) => {
                self.release_artifact();
                let handle = self.host.publish(&png);
                debug!(sequence = outcome.sequence, ?handle, "artifact committed");
                self.artifact = Some(CroppedArtifact {
                    sequence: outcome.sequence,
                    rect: outcome.rect,
                    extraction: outcome.extraction,
                    png,
                    handle,
                });
                true
            }
            Err(e) => {
                warn!(sequence = outcome.sequence, error = %e, "artifact encoding failed");
                self.release_artifact();
                false
            }
        }
    }

    /// Run an encode job immediately and commit it.
    pub fn encode_now(&mut self, job: EncodeJob) -> bool {
        self.finish_encoding(job.run())
    }

    /// Hand the current artifact to the host for saving.
    ///
    /// Returns `false` (and does nothing) when there is no artifact.
    pub fn export(&mut self) -> bool {
        match &self.artifact {
            Some(artifact) => {
                self.host.save(artifact.handle, &self.config.export_filename);
                true
            }
            None => {
                debug!("export requested without an artifact");
                false
            }
        }
    }

    fn release_artifact(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            self.host.revoke(artifact.handle);
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.last_sequence += 1;
        self.last_sequence
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &CropperConfig {
        &self.config
    }

    pub fn state(&self) -> &CropState {
        &self.state
    }

    pub fn rect(&self) -> Option<CropRect> {
        self.state.rect()
    }

    pub fn natural(&self) -> Option<Dimensions> {
        self.state.frame().map(|f| f.natural)
    }

    pub fn displayed(&self) -> Option<Dimensions> {
        self.state.frame().map(|f| f.displayed)
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    /// Latest extraction, available before its encoding completes.
    pub fn preview(&self) -> Option<&Extraction> {
        self.preview.as_ref()
    }

    pub fn artifact(&self) -> Option<&CroppedArtifact> {
        self.artifact.as_ref()
    }

    pub fn selection_info(&self) -> Option<SelectionInfo> {
        let rect = self.state.rect()?;
        let displayed = self.state.frame()?.displayed;
        Some(SelectionInfo {
            x: rect.x.round() as i64,
            y: rect.y.round() as i64,
            width: rect.width.round() as i64,
            height: rect.height.round() as i64,
            image_width: displayed.width.round() as i64,
            image_height: displayed.height.round() as i64,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
