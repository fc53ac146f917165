//! Input shapes accepted by processors.
//!
//! - `Bitmap`: an already decoded RGBA image.
//! - raw buffers: borrowed bytes in a known `ImageFormat`, plus `FrameMetadata`.
//! - `ImageProxy`: a platform image handle that must be released exactly once.
//!
//! All three are normalized into an `InputImage` before reaching a detector.

use std::fmt;

use crate::frame::FrameMetadata;

use super::failure::ProcessingFailure;

/// Decoded bitmap. Decoding itself happens outside this crate.
pub type Bitmap = image::RgbaImage;

/// Pixel layouts understood by the bundled detectors.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Y plane followed by interleaved VU (camera preview default).
    Nv21,
    /// Y plane followed by V and U planes.
    Yv12,
    Gray8,
    Rgba8,
}

impl ImageFormat {
    /// Minimum byte length of a `width`x`height` frame in this format.
    pub fn bytes_for(self, width: u32, height: u32) -> Option<usize> {
        let w = width as usize;
        let h = height as usize;
        let luma = w.checked_mul(h)?;
        match self {
            ImageFormat::Nv21 | ImageFormat::Yv12 => {
                let chroma = w.div_ceil(2).checked_mul(h.div_ceil(2))?.checked_mul(2)?;
                luma.checked_add(chroma)
            }
            ImageFormat::Gray8 => Some(luma),
            ImageFormat::Rgba8 => luma.checked_mul(4),
        }
    }
}

// ----------------------------------------------------------------------------
// InputImage: normalized borrowed view
// ----------------------------------------------------------------------------

/// Borrowed pixels plus geometry, validated on construction.
///
/// Width and height are always non-zero and `pixels` is at least as long as
/// the format requires.
#[derive(Clone, Copy, Debug)]
pub struct InputImage<'a> {
    pixels: &'a [u8],
    format: ImageFormat,
    metadata: FrameMetadata,
}

impl<'a> InputImage<'a> {
    pub fn from_buffer(
        pixels: &'a [u8],
        format: ImageFormat,
        metadata: FrameMetadata,
    ) -> Result<Self, ProcessingFailure> {
        if metadata.width() == 0 || metadata.height() == 0 {
            return Err(ProcessingFailure::InvalidFrame(format!(
                "frame size {}x{} has a zero dimension",
                metadata.width(),
                metadata.height()
            )));
        }
        let expected = format
            .bytes_for(metadata.width(), metadata.height())
            .ok_or_else(|| ProcessingFailure::InvalidFrame("frame dimensions overflow".into()))?;
        if pixels.len() < expected {
            return Err(ProcessingFailure::InvalidFrame(format!(
                "expected at least {} {:?} bytes for {}x{}, received {}",
                expected,
                format,
                metadata.width(),
                metadata.height(),
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            format,
            metadata,
        })
    }

    /// Bitmaps are already upright, so rotation is zero.
    pub fn from_bitmap(bitmap: &'a Bitmap) -> Result<Self, ProcessingFailure> {
        let metadata = FrameMetadata::builder()
            .width(bitmap.width())
            .height(bitmap.height())
            .rotation(0)
            .build();
        Self::from_buffer(bitmap.as_raw(), ImageFormat::Rgba8, metadata)
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    pub fn width(&self) -> u32 {
        self.metadata.width()
    }

    pub fn height(&self) -> u32 {
        self.metadata.height()
    }

    /// Luma of the pixel at (`x`, `y`) in sensor (unrotated) coordinates.
    ///
    /// Caller must keep `x < width` and `y < height`.
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        let idx = y as usize * self.width() as usize + x as usize;
        match self.format {
            ImageFormat::Nv21 | ImageFormat::Yv12 | ImageFormat::Gray8 => self.pixels[idx],
            ImageFormat::Rgba8 => {
                let px = &self.pixels[idx * 4..idx * 4 + 3];
                // BT.601 integer approximation.
                ((77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8) as u8
            }
        }
    }
}

// ----------------------------------------------------------------------------
// ImageProxy: scoped platform image handle
// ----------------------------------------------------------------------------

type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// Platform image handle owned by the capture layer.
///
/// The release hook runs exactly once: on [`close`](Self::close), or on drop
/// if the handle was never closed explicitly.
pub struct ImageProxy {
    data: Vec<u8>,
    format: ImageFormat,
    metadata: FrameMetadata,
    release: Option<ReleaseFn>,
}

impl ImageProxy {
    pub fn new(data: Vec<u8>, format: ImageFormat, metadata: FrameMetadata) -> Self {
        Self {
            data,
            format,
            metadata,
            release: None,
        }
    }

    /// Attach the hook that returns the handle to its owner.
    pub fn with_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    pub fn width(&self) -> u32 {
        self.metadata.width()
    }

    pub fn height(&self) -> u32 {
        self.metadata.height()
    }

    pub fn rotation(&self) -> i32 {
        self.metadata.rotation()
    }

    pub fn input_image(&self) -> Result<InputImage<'_>, ProcessingFailure> {
        InputImage::from_buffer(&self.data, self.format, self.metadata)
    }

    /// Release the handle now.
    pub fn close(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ImageProxy {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for ImageProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageProxy")
            .field("len", &self.data.len())
            .field("format", &self.format)
            .field("metadata", &self.metadata)
            .field("released", &self.release.is_none())
            .finish()
    }
}
