//! Vision Harness
//!
//! On-device frame processing harness: camera frames come in as bitmaps, raw
//! buffers or platform image handles, and are dispatched to a background
//! executor that can be revoked.
//!
//! # Architecture
//!
//! - `frame`: immutable frame geometry (`FrameMetadata`) and its builder.
//! - `executor`: the `Executor` shape, a thread pool, and `ScopedExecutor`,
//!   which adds one-way revocation on top of any delegate.
//! - `process`: the `VisionProcessor` contract, the `Detector` plug-in trait,
//!   bundled detectors, overlay sink and processor registry.
//! - `dispatch`: `FrameDispatcher`, which routes frames through a
//!   `ScopedExecutor` into a selected processor.
//! - `source`: synthetic frame source for demos and tests.
//! - `config`: JSON file + environment configuration.
//!
//! # Revocation
//!
//! A `ScopedExecutor` checks its revoked flag twice: when work is submitted
//! and again when the delegate starts running it. After `revoke()` no further
//! work starts; work already running is left to finish.

pub mod config;
pub mod dispatch;
pub mod executor;
pub mod frame;
pub mod process;
pub mod source;

pub use dispatch::FrameDispatcher;
pub use executor::{Executor, InlineExecutor, ScopedExecutor, ThreadPoolExecutor, Work};
pub use frame::{FrameMetadata, FrameMetadataBuilder};
pub use process::{
    Bitmap, BrightRegionDetector, Detector, DetectorProcessor, Graphic, GraphicOverlay,
    ImageFormat, ImageProxy, InputImage, MotionDetector, ProcessingFailure, ProcessorRegistry,
    Rect, SharedProcessor, VisionProcessor,
};
pub use source::{SyntheticConfig, SyntheticSource};
