//! Synthetic frame source.
//!
//! Stands in for the camera capture layer: produces NV21 buffers with a
//! bright square that moves one step per frame, plus matching metadata.

use anyhow::{anyhow, Result};

use crate::frame::{FrameMetadata, FrameMetadataBuilder};
use crate::process::{ImageFormat, ImageProxy};

const BACKGROUND_LUMA: u8 = 16;
const SQUARE_LUMA: u8 = 235;
const NEUTRAL_CHROMA: u8 = 128;

/// Configuration for the synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Clockwise degrees reported with every frame.
    pub rotation: i32,
    /// Side of the moving square, in pixels.
    pub square: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            rotation: 0,
            square: 32,
        }
    }
}

pub struct SyntheticSource {
    metadata: FrameMetadata,
    square: u32,
    frame_len: usize,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic frame size must be positive"));
        }
        let frame_len = ImageFormat::Nv21
            .bytes_for(config.width, config.height)
            .ok_or_else(|| anyhow!("synthetic frame dimensions overflow"))?;
        let metadata = FrameMetadataBuilder::new()
            .width(config.width)
            .height(config.height)
            .rotation(config.rotation)
            .build();
        Ok(Self {
            metadata,
            square: config.square.clamp(1, config.width.min(config.height)),
            frame_len,
            frame_count: 0,
        })
    }

    pub fn metadata(&self) -> FrameMetadata {
        self.metadata
    }

    pub fn frames_generated(&self) -> u64 {
        self.frame_count
    }

    /// Next NV21 frame.
    pub fn next_frame(&mut self) -> (Vec<u8>, FrameMetadata) {
        let width = self.metadata.width() as usize;
        let height = self.metadata.height() as usize;
        let luma_len = width * height;
        let mut pixels = vec![BACKGROUND_LUMA; self.frame_len];
        pixels[luma_len..].fill(NEUTRAL_CHROMA);

        let side = self.square as usize;
        let span = width - side + 1;
        let origin_x = (self.frame_count as usize) % span;
        let origin_y = (height - side) / 2;
        for y in origin_y..origin_y + side {
            let row = y * width;
            pixels[row + origin_x..row + origin_x + side].fill(SQUARE_LUMA);
        }

        self.frame_count += 1;
        (pixels, self.metadata)
    }

    /// Next frame wrapped as an image handle with the given release hook.
    pub fn next_image<F>(&mut self, release: F) -> ImageProxy
    where
        F: FnOnce() + Send + 'static,
    {
        let (pixels, metadata) = self.next_frame();
        ImageProxy::new(pixels, ImageFormat::Nv21, metadata).with_release(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_have_nv21_length_and_move() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            width: 8,
            height: 4,
            rotation: 90,
            square: 2,
        })
        .unwrap();

        let (first, meta) = source.next_frame();
        let (second, _) = source.next_frame();
        assert_eq!(first.len(), 8 * 4 + 8 * 4 / 2);
        assert_eq!(meta.rotation(), 90);
        assert_ne!(first, second);
        assert_eq!(first[8], SQUARE_LUMA);
        assert_eq!(second[8], BACKGROUND_LUMA);
        assert_eq!(source.frames_generated(), 2);
    }

    #[test]
    fn rejects_empty_frames() {
        let config = SyntheticConfig {
            width: 0,
            ..SyntheticConfig::default()
        };
        assert!(SyntheticSource::new(config).is_err());
    }
}
