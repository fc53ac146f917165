use thiserror::Error;

/// Why a frame could not be processed.
///
/// Returned by the fallible `VisionProcessor` variants and by detectors.
/// Dispatch never inspects these; they belong to whoever called `process_*`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingFailure {
    /// Geometry or buffer length does not describe a usable frame.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The detector cannot consume this pixel format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The underlying model is not loaded or refused to run.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The processor was invoked after `stop()`.
    #[error("processor stopped")]
    Stopped,
}
