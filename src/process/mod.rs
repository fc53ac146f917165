//! Frame processing contract.
//!
//! - `VisionProcessor`: one entry point per input shape (bitmap, raw buffer,
//!   platform image handle) plus `stop()`.
//! - `Detector`: the algorithm behind a processor. Bundled detectors are simple
//!   stand-ins; real vision models plug in through the same trait.
//! - `GraphicOverlay`: where processors put their results.
//! - `ProcessorRegistry`: named processors for callers to choose from.

pub mod detectors;
mod failure;
mod input;
mod overlay;
mod processor;
mod registry;

pub use detectors::{BrightRegionDetector, MotionDetector};
pub use failure::ProcessingFailure;
pub use input::{Bitmap, ImageFormat, ImageProxy, InputImage};
pub use overlay::{Graphic, GraphicOverlay, Rect, Transform};
pub use processor::{Detector, DetectorProcessor, VisionProcessor};
pub use registry::{ProcessorRegistry, SharedProcessor};
