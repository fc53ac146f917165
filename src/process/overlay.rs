//! Overlay sink for processor results.
//!
//! Graphics are stored in image coordinates. The overlay tracks the image
//! source size and the view size so consumers can map image coordinates to
//! view coordinates (scale to fill, center crop, optional horizontal mirror).
//! Rendering is out of scope; this is the model a renderer would read.

use anyhow::{anyhow, Result};
use std::sync::Mutex;

/// Axis-aligned rectangle in image pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// One element drawn over the preview.
#[derive(Clone, Debug, PartialEq)]
pub enum Graphic {
    Box {
        bounds: Rect,
        label: String,
        confidence: f32,
    },
    Text {
        bounds: Rect,
        text: String,
    },
}

impl Graphic {
    pub fn bounds(&self) -> Rect {
        match self {
            Graphic::Box { bounds, .. } | Graphic::Text { bounds, .. } => *bounds,
        }
    }
}

#[derive(Debug, Default)]
struct OverlayState {
    graphics: Vec<Graphic>,
    image_width: u32,
    image_height: u32,
    view_width: u32,
    view_height: u32,
    flipped: bool,
}

/// Geometry snapshot used for coordinate mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub flipped: bool,
    pub view_width: f32,
}

impl Transform {
    pub fn scale(&self, image_px: f32) -> f32 {
        image_px * self.scale
    }

    pub fn translate_x(&self, x: f32) -> f32 {
        let mapped = self.scale(x) - self.offset_x;
        if self.flipped {
            self.view_width - mapped
        } else {
            mapped
        }
    }

    pub fn translate_y(&self, y: f32) -> f32 {
        self.scale(y) - self.offset_y
    }
}

/// Thread-safe collection of graphics plus source/view geometry.
#[derive(Debug, Default)]
pub struct GraphicOverlay {
    state: Mutex<OverlayState>,
}

impl GraphicOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.graphics.clear();
        }
    }

    pub fn add(&self, graphic: Graphic) {
        if let Ok(mut state) = self.state.lock() {
            state.graphics.push(graphic);
        }
    }

    /// Remove the graphic at `index`, if present.
    pub fn remove(&self, index: usize) -> Option<Graphic> {
        let mut state = self.state.lock().ok()?;
        if index < state.graphics.len() {
            Some(state.graphics.remove(index))
        } else {
            None
        }
    }

    pub fn graphics(&self) -> Vec<Graphic> {
        self.state
            .lock()
            .map(|state| state.graphics.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.graphics.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the image detections are expressed in, and whether it is mirrored.
    pub fn set_image_source_info(&self, width: u32, height: u32, flipped: bool) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(anyhow!("image source size must be positive"));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("overlay lock poisoned"))?;
        state.image_width = width;
        state.image_height = height;
        state.flipped = flipped;
        Ok(())
    }

    /// Swap in a new frame's geometry and graphics in one step, so readers
    /// never see the new size with stale graphics.
    pub fn replace(
        &self,
        width: u32,
        height: u32,
        flipped: bool,
        graphics: Vec<Graphic>,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(anyhow!("image source size must be positive"));
        }
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("overlay lock poisoned"))?;
        state.image_width = width;
        state.image_height = height;
        state.flipped = flipped;
        state.graphics = graphics;
        Ok(())
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        let state = self.state.lock().ok()?;
        (state.image_width > 0).then_some((state.image_width, state.image_height))
    }

    pub fn set_view_size(&self, width: u32, height: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.view_width = width;
            state.view_height = height;
        }
    }

    /// Current image-to-view mapping, or `None` until both sizes are known.
    pub fn transform(&self) -> Option<Transform> {
        let state = self.state.lock().ok()?;
        if state.image_width == 0
            || state.image_height == 0
            || state.view_width == 0
            || state.view_height == 0
        {
            return None;
        }
        let view_w = state.view_width as f32;
        let view_h = state.view_height as f32;
        let image_w = state.image_width as f32;
        let image_h = state.image_height as f32;
        let image_aspect = image_w / image_h;

        let (scale, offset_x, offset_y) = if view_w / view_h > image_aspect {
            // Wider view: crop top and bottom.
            (view_w / image_w, 0.0, (view_w / image_aspect - view_h) / 2.0)
        } else {
            (view_h / image_h, (view_h * image_aspect - view_w) / 2.0, 0.0)
        };
        Some(Transform {
            scale,
            offset_x,
            offset_y,
            flipped: state.flipped,
            view_width: view_w,
        })
    }
}

#[cfg(test)]
impl GraphicOverlay {
    /// Leave the state lock poisoned, as a panicking reader would.
    pub(crate) fn poison(&self) {
        std::thread::scope(|scope| {
            let joined = scope
                .spawn(|| {
                    let _state = self.state.lock();
                    panic!("overlay reader panicked");
                })
                .join();
            assert!(joined.is_err());
        });
    }
}
