//! vision_harness - run synthetic camera frames through a revocable dispatcher
//!
//! This binary:
//! 1. Loads configuration (VISION_HARNESS_CONFIG + env overrides)
//! 2. Starts a worker pool and wraps it in a FrameDispatcher
//! 3. Feeds synthetic frames as raw buffers or image handles
//! 4. Revokes dispatch after --revoke-after frames or on Ctrl-C
//! 5. Reports how many frames were submitted and released

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vision_harness::config::HarnessConfig;
use vision_harness::{FrameDispatcher, GraphicOverlay, SyntheticSource, ThreadPoolExecutor};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputMode {
    /// Raw NV21 buffers with frame metadata.
    Buffer,
    /// Platform image handles released after processing.
    Image,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of synthetic frames to generate.
    #[arg(long, default_value_t = 30)]
    frames: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Revoke dispatch after this many frames have been submitted.
    #[arg(long)]
    revoke_after: Option<u64>,
    /// Processor to use (overrides config).
    #[arg(long, env = "VISION_HARNESS_PROCESSOR")]
    processor: Option<String>,
    /// How frames are handed to the processor.
    #[arg(long, value_enum, default_value_t = InputMode::Buffer)]
    mode: InputMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    let mut cfg = HarnessConfig::load()?;
    if let Some(processor) = args.processor {
        cfg.processor = processor.to_lowercase();
    }
    let registry = cfg.build_registry()?;
    let processor = registry
        .default_processor()
        .ok_or_else(|| anyhow!("no processor registered"))?;

    let pool = Arc::new(ThreadPoolExecutor::new(cfg.workers)?);
    let overlay = Arc::new(GraphicOverlay::new());
    let dispatcher = Arc::new(FrameDispatcher::new(
        pool.clone(),
        processor,
        overlay.clone(),
    ));

    let interrupt = dispatcher.clone();
    ctrlc::set_handler(move || {
        log::warn!("interrupt received; revoking dispatch");
        interrupt.shutdown();
    })?;

    let mut source = SyntheticSource::new(cfg.synthetic_source())?;
    let released = Arc::new(AtomicU64::new(0));
    let frame_interval = Duration::from_secs_f64(1.0 / args.fps as f64);
    log::info!(
        "dispatching {} {:?} frames to '{}' on {} workers",
        args.frames,
        args.mode,
        cfg.processor,
        cfg.workers
    );

    let mut submitted = 0u64;
    for idx in 0..args.frames {
        if args.revoke_after == Some(idx) {
            log::info!("revoking dispatch after {} frames", idx);
            dispatcher.shutdown();
        }
        if dispatcher.is_revoked() {
            break;
        }
        match args.mode {
            InputMode::Buffer => {
                let (pixels, metadata) = source.next_frame();
                dispatcher.submit_buffer(pixels, metadata);
            }
            InputMode::Image => {
                let released = released.clone();
                let image = source.next_image(move || {
                    released.fetch_add(1, Ordering::Relaxed);
                });
                dispatcher.submit_image(image);
            }
        }
        submitted += 1;
        std::thread::sleep(frame_interval);
    }

    dispatcher.shutdown();
    pool.shutdown()?;
    registry.stop_all();

    println!("frames generated: {}", source.frames_generated());
    println!("frames submitted: {}", submitted);
    if matches!(args.mode, InputMode::Image) {
        println!("image handles released: {}", released.load(Ordering::Relaxed));
    }
    match overlay.image_size() {
        Some((width, height)) => println!(
            "overlay: {} graphics on {}x{} image",
            overlay.len(),
            width,
            height
        ),
        None => println!("overlay: empty"),
    }
    for graphic in overlay.graphics() {
        println!("  {:?}", graphic);
    }
    Ok(())
}
