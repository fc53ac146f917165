use crate::frame::FrameMetadata;

use super::failure::ProcessingFailure;
use super::input::{Bitmap, ImageFormat, ImageProxy, InputImage};
use super::overlay::{Graphic, GraphicOverlay};

/// Frame consumer with one entry point per input shape.
///
/// Lifecycle is live -> stopped, one way. After `stop()` the fallible
/// variants fail fast with [`ProcessingFailure::Stopped`] and
/// `process_bitmap` is a logged no-op. Callers should not rely on either;
/// invoking a stopped processor is a caller bug.
pub trait VisionProcessor: Send {
    /// Processor identifier.
    fn name(&self) -> &'static str;

    /// Process an already decoded bitmap.
    fn process_bitmap(&mut self, bitmap: &Bitmap, overlay: &GraphicOverlay);

    /// Process a raw camera buffer described by `metadata`.
    fn process_buffer(
        &mut self,
        data: &[u8],
        metadata: &FrameMetadata,
        overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure>;

    /// Process a platform image handle. The handle is released exactly once,
    /// whether processing succeeds or fails.
    fn process_image(
        &mut self,
        image: ImageProxy,
        overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure>;

    /// Release underlying resources. Idempotent.
    fn stop(&mut self);
}

/// Pluggable detection algorithm driven by [`DetectorProcessor`].
///
/// Implementations must treat the pixel slice as read-only and must not keep
/// it beyond the `detect` call.
pub trait Detector: Send {
    fn name(&self) -> &'static str;

    /// Run detection. Graphics are expressed in upright image coordinates.
    fn detect(&mut self, image: &InputImage<'_>) -> Result<Vec<Graphic>, ProcessingFailure>;

    /// Release model resources.
    fn close(&mut self) {}
}

/// Generic `VisionProcessor` over a [`Detector`].
///
/// Validates each input, runs the detector, and on success replaces the
/// overlay contents with the new graphics.
pub struct DetectorProcessor<D: Detector> {
    detector: D,
    buffer_format: ImageFormat,
    flipped: bool,
    stopped: bool,
    frames_processed: u64,
    frames_failed: u64,
}

impl<D: Detector> DetectorProcessor<D> {
    /// Raw buffers are assumed to be NV21 unless overridden.
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            buffer_format: ImageFormat::Nv21,
            flipped: false,
            stopped: false,
            frames_processed: 0,
            frames_failed: 0,
        }
    }

    pub fn with_buffer_format(mut self, format: ImageFormat) -> Self {
        self.buffer_format = format;
        self
    }

    /// Mirror graphics horizontally (front-facing cameras).
    pub fn with_flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed
    }

    fn run(
        &mut self,
        input: Result<InputImage<'_>, ProcessingFailure>,
        overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure> {
        let outcome = input.and_then(|input| {
            let graphics = self.detector.detect(&input)?;
            Ok((input.metadata(), graphics))
        });
        match outcome {
            Ok((metadata, graphics)) => {
                let (width, height) = metadata.upright_size();
                let count = graphics.len();
                if let Err(e) = overlay.replace(width, height, self.flipped, graphics) {
                    self.frames_failed += 1;
                    log::warn!("{}: overlay not updated: {}", self.detector.name(), e);
                    return Err(ProcessingFailure::InvalidFrame(e.to_string()));
                }
                self.frames_processed += 1;
                log::debug!(
                    "{}: {} graphics for {}x{} frame",
                    self.detector.name(),
                    count,
                    width,
                    height
                );
                Ok(())
            }
            Err(err) => {
                self.frames_failed += 1;
                log::warn!("{}: detection failed: {}", self.detector.name(), err);
                Err(err)
            }
        }
    }
}

impl<D: Detector> VisionProcessor for DetectorProcessor<D> {
    fn name(&self) -> &'static str {
        self.detector.name()
    }

    fn process_bitmap(&mut self, bitmap: &Bitmap, overlay: &GraphicOverlay) {
        if self.stopped {
            log::warn!("{}: bitmap ignored, processor stopped", self.name());
            return;
        }
        // Failures are already logged and counted; this variant has no error channel.
        let _ = self.run(InputImage::from_bitmap(bitmap), overlay);
    }

    fn process_buffer(
        &mut self,
        data: &[u8],
        metadata: &FrameMetadata,
        overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure> {
        if self.stopped {
            return Err(ProcessingFailure::Stopped);
        }
        let input = InputImage::from_buffer(data, self.buffer_format, *metadata);
        self.run(input, overlay)
    }

    fn process_image(
        &mut self,
        image: ImageProxy,
        overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure> {
        let result = if self.stopped {
            Err(ProcessingFailure::Stopped)
        } else {
            self.run(image.input_image(), overlay)
        };
        image.close();
        result
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.detector.close();
        log::info!(
            "{}: stopped after {} frames ({} failed)",
            self.detector.name(),
            self.frames_processed,
            self.frames_failed
        );
    }
}
