use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::process::{
    BrightRegionDetector, DetectorProcessor, ImageFormat, MotionDetector, ProcessorRegistry,
};
use crate::source::SyntheticConfig;

const DEFAULT_WORKERS: usize = 2;
const DEFAULT_PROCESSOR: &str = "motion";
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_FRAME_ROTATION: i32 = 0;
const DEFAULT_LUMA_THRESHOLD: u8 = crate::process::detectors::bright::DEFAULT_LUMA_THRESHOLD;
const DEFAULT_FLIPPED: bool = false;

/// Processor names understood by [`HarnessConfig::build_registry`].
pub const PROCESSOR_NAMES: [&str; 2] = ["motion", "bright"];

#[derive(Debug, Deserialize, Default)]
struct HarnessConfigFile {
    workers: Option<usize>,
    processor: Option<String>,
    frame: Option<FrameConfigFile>,
    bright: Option<BrightConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct FrameConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    rotation: Option<i32>,
    flipped: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct BrightConfigFile {
    luma_threshold: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub workers: usize,
    pub processor: String,
    pub frame: FrameSettings,
    pub luma_threshold: u8,
}

#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
    /// Clockwise degrees; must be a multiple of 90.
    pub rotation: i32,
    pub flipped: bool,
}

impl HarnessConfig {
    /// Defaults, then the JSON file named by `VISION_HARNESS_CONFIG`, then
    /// environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VISION_HARNESS_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: HarnessConfigFile) -> Self {
        let frame = file.frame.unwrap_or_default();
        Self {
            workers: file.workers.unwrap_or(DEFAULT_WORKERS),
            processor: file
                .processor
                .unwrap_or_else(|| DEFAULT_PROCESSOR.to_string()),
            frame: FrameSettings {
                width: frame.width.unwrap_or(DEFAULT_FRAME_WIDTH),
                height: frame.height.unwrap_or(DEFAULT_FRAME_HEIGHT),
                rotation: frame.rotation.unwrap_or(DEFAULT_FRAME_ROTATION),
                flipped: frame.flipped.unwrap_or(DEFAULT_FLIPPED),
            },
            luma_threshold: file
                .bright
                .and_then(|bright| bright.luma_threshold)
                .unwrap_or(DEFAULT_LUMA_THRESHOLD),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(workers) = env_parse::<usize>("VISION_HARNESS_WORKERS")? {
            self.workers = workers;
        }
        if let Ok(processor) = std::env::var("VISION_HARNESS_PROCESSOR") {
            if !processor.trim().is_empty() {
                self.processor = processor.trim().to_string();
            }
        }
        if let Some(width) = env_parse::<u32>("VISION_HARNESS_FRAME_WIDTH")? {
            self.frame.width = width;
        }
        if let Some(height) = env_parse::<u32>("VISION_HARNESS_FRAME_HEIGHT")? {
            self.frame.height = height;
        }
        if let Some(rotation) = env_parse::<i32>("VISION_HARNESS_FRAME_ROTATION")? {
            self.frame.rotation = rotation;
        }
        if let Some(threshold) = env_parse::<u8>("VISION_HARNESS_LUMA_THRESHOLD")? {
            self.luma_threshold = threshold;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow!("workers must be greater than zero"));
        }
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(anyhow!("frame width and height must be greater than zero"));
        }
        if self.frame.rotation % 90 != 0 {
            return Err(anyhow!(
                "frame rotation must be a multiple of 90 degrees, got {}",
                self.frame.rotation
            ));
        }
        self.processor = self.processor.to_lowercase();
        if !PROCESSOR_NAMES.contains(&self.processor.as_str()) {
            return Err(anyhow!(
                "unknown processor '{}' (expected one of: {})",
                self.processor,
                PROCESSOR_NAMES.join(", ")
            ));
        }
        Ok(())
    }

    /// Registry holding every bundled processor, with the configured one as default.
    pub fn build_registry(&self) -> Result<ProcessorRegistry> {
        let mut registry = ProcessorRegistry::new();
        registry.register(
            DetectorProcessor::new(MotionDetector::new())
                .with_buffer_format(ImageFormat::Nv21)
                .with_flipped(self.frame.flipped),
        );
        registry.register(
            DetectorProcessor::new(BrightRegionDetector::new(self.luma_threshold))
                .with_buffer_format(ImageFormat::Nv21)
                .with_flipped(self.frame.flipped),
        );
        registry.set_default(&self.processor)?;
        Ok(registry)
    }

    pub fn synthetic_source(&self) -> SyntheticConfig {
        SyntheticConfig {
            width: self.frame.width,
            height: self.frame.height,
            rotation: self.frame.rotation,
            ..SyntheticConfig::default()
        }
    }
}

fn read_config_file(path: &Path) -> Result<HarnessConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value '{}'", key, value)),
        _ => Ok(None),
    }
}
