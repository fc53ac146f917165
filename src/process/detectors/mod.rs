pub mod bright;
pub mod motion;

pub use bright::BrightRegionDetector;
pub use motion::MotionDetector;
