//! Frame geometry.
//!
//! - `FrameMetadata`: immutable width/height/rotation of one captured frame.
//! - `FrameMetadataBuilder`: accumulates the three fields, then snapshots them.
//!
//! Rotation is expressed in clockwise degrees as reported by the capture layer.
//! Only multiples of 90 are meaningful to the helpers below; other values are
//! carried through untouched and treated as "not quarter-turned".
//!
//! No validation happens here. Processors are responsible for rejecting
//! degenerate geometry (zero dimensions, overflowing pixel counts).

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// FrameMetadata: immutable geometry snapshot
// ----------------------------------------------------------------------------

/// Geometry of a single frame handed alongside a raw buffer.
///
/// Fields are private; the only way to produce one is through
/// [`FrameMetadataBuilder::build`], and nothing mutates it afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameMetadata {
    width: u32,
    height: u32,
    /// Clockwise degrees.
    rotation: i32,
}

impl FrameMetadata {
    pub fn builder() -> FrameMetadataBuilder {
        FrameMetadataBuilder::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// True for 90 and 270 degrees (any multiple thereof, either direction).
    pub fn is_quarter_turned(&self) -> bool {
        matches!(self.rotation.rem_euclid(360), 90 | 270)
    }

    /// Size of the frame once rotated upright.
    ///
    /// Width and height swap for quarter turns; this is the size detection
    /// coordinates are expressed in.
    pub fn upright_size(&self) -> (u32, u32) {
        if self.is_quarter_turned() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Number of pixels, or `None` if it does not fit in `usize`.
    pub fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }
}

// ----------------------------------------------------------------------------
// FrameMetadataBuilder
// ----------------------------------------------------------------------------

/// Fluent accumulator for [`FrameMetadata`].
///
/// Unset fields default to zero. `build` copies the current state, so the
/// builder can keep being mutated without affecting earlier snapshots.
#[derive(Clone, Debug, Default)]
pub struct FrameMetadataBuilder {
    width: u32,
    height: u32,
    rotation: i32,
}

impl FrameMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&mut self, width: u32) -> &mut Self {
        self.width = width;
        self
    }

    pub fn height(&mut self, height: u32) -> &mut Self {
        self.height = height;
        self
    }

    pub fn rotation(&mut self, rotation: i32) -> &mut Self {
        self.rotation = rotation;
        self
    }

    pub fn build(&self) -> FrameMetadata {
        FrameMetadata {
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
