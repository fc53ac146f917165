use sha2::{Digest, Sha256};

use crate::process::failure::ProcessingFailure;
use crate::process::input::InputImage;
use crate::process::overlay::{Graphic, Rect};
use crate::process::processor::Detector;

const MOTION_CONFIDENCE: f32 = 0.85;

/// Frame-change detector. Hashes the luma plane and compares it with the
/// previous frame; a change yields one box covering the whole frame.
///
/// Frames of different geometry never count as motion; the first frame after
/// a size change only resets the baseline.
#[derive(Default)]
pub struct MotionDetector {
    last: Option<(u32, u32, [u8; 32])>,
}

impl MotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    fn luma_hash(image: &InputImage<'_>) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for y in 0..image.height() {
            let row: Vec<u8> = (0..image.width()).map(|x| image.luma(x, y)).collect();
            hasher.update(&row);
        }
        hasher.finalize().into()
    }
}

impl Detector for MotionDetector {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn detect(&mut self, image: &InputImage<'_>) -> Result<Vec<Graphic>, ProcessingFailure> {
        let current = (image.width(), image.height(), Self::luma_hash(image));

        let motion = self.last.is_some_and(|(w, h, prev)| {
            w == current.0 && h == current.1 && prev != current.2
        });

        self.last = Some(current);

        if !motion {
            return Ok(Vec::new());
        }
        let (width, height) = image.metadata().upright_size();
        Ok(vec![Graphic::Box {
            bounds: Rect::new(0.0, 0.0, width as f32, height as f32),
            label: "motion".to_string(),
            confidence: MOTION_CONFIDENCE,
        }])
    }

    fn close(&mut self) {
        self.last = None;
    }
}
