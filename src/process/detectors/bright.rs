use crate::process::failure::ProcessingFailure;
use crate::process::input::InputImage;
use crate::process::overlay::{Graphic, Rect};
use crate::process::processor::Detector;

pub const DEFAULT_LUMA_THRESHOLD: u8 = 200;

/// Bounding box of all pixels at or above a luma threshold.
///
/// Confidence is the share of bright pixels inside the box. The box is
/// reported in upright coordinates (rotation applied).
pub struct BrightRegionDetector {
    threshold: u8,
    min_pixels: usize,
}

impl BrightRegionDetector {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            min_pixels: 1,
        }
    }

    /// Ignore regions with fewer than `min_pixels` bright pixels.
    pub fn with_min_pixels(mut self, min_pixels: usize) -> Self {
        self.min_pixels = min_pixels.max(1);
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl Default for BrightRegionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LUMA_THRESHOLD)
    }
}

impl Detector for BrightRegionDetector {
    fn name(&self) -> &'static str {
        "bright"
    }

    fn detect(&mut self, image: &InputImage<'_>) -> Result<Vec<Graphic>, ProcessingFailure> {
        let (width, height) = (image.width(), image.height());
        let mut count = 0usize;
        let (mut left, mut top, mut right, mut bottom) = (u32::MAX, u32::MAX, 0u32, 0u32);

        for y in 0..height {
            for x in 0..width {
                if image.luma(x, y) >= self.threshold {
                    count += 1;
                    left = left.min(x);
                    top = top.min(y);
                    right = right.max(x + 1);
                    bottom = bottom.max(y + 1);
                }
            }
        }

        if count < self.min_pixels {
            return Ok(Vec::new());
        }

        let area = (right - left) as f32 * (bottom - top) as f32;
        let sensor = Rect::new(left as f32, top as f32, right as f32, bottom as f32);
        Ok(vec![Graphic::Box {
            bounds: rotate_rect(sensor, width as f32, height as f32, image.metadata().rotation()),
            label: "bright".to_string(),
            confidence: count as f32 / area,
        }])
    }
}

/// Map a rect from sensor coordinates to upright coordinates for a clockwise
/// rotation. Non-quarter rotations are left unrotated.
fn rotate_rect(r: Rect, width: f32, height: f32, rotation: i32) -> Rect {
    match rotation.rem_euclid(360) {
        90 => Rect::new(height - r.bottom, r.left, height - r.top, r.right),
        180 => Rect::new(width - r.right, height - r.bottom, width - r.left, height - r.top),
        270 => Rect::new(r.top, width - r.right, r.bottom, width - r.left),
        _ => r,
    }
}
