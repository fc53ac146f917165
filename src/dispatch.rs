//! Frame dispatch.
//!
//! `FrameDispatcher` moves each incoming frame into a unit of work on a
//! `ScopedExecutor`. The work locks the selected processor and calls the
//! matching `process_*` variant. Processing failures stop at the work: they
//! are logged there and never surface through the dispatcher.
//!
//! `shutdown()` revokes the executor first, so queued frames are skipped,
//! then stops the processor. The stopped flag is set under the processor
//! lock and re-checked by each work after it takes that lock, so a frame
//! that was already admitted never reaches a stopped processor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::executor::{Executor, ScopedExecutor};
use crate::frame::FrameMetadata;
use crate::process::{Bitmap, GraphicOverlay, ImageProxy, SharedProcessor};

pub struct FrameDispatcher<E: Executor + ?Sized> {
    executor: ScopedExecutor<E>,
    processor: SharedProcessor,
    overlay: Arc<GraphicOverlay>,
    stopped: Arc<AtomicBool>,
}

impl<E: Executor + ?Sized> FrameDispatcher<E> {
    pub fn new(delegate: Arc<E>, processor: SharedProcessor, overlay: Arc<GraphicOverlay>) -> Self {
        Self {
            executor: ScopedExecutor::new(delegate),
            processor,
            overlay,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn submit_bitmap(&self, bitmap: Bitmap) {
        let processor = self.processor.clone();
        let overlay = self.overlay.clone();
        let stopped = self.stopped.clone();
        self.executor.submit(move || {
            let Ok(mut guard) = processor.lock() else {
                log::error!("processor lock poisoned; dropping bitmap");
                return;
            };
            if stopped.load(Ordering::Acquire) {
                log::trace!("{}: stopped; skipping bitmap", guard.name());
                return;
            }
            guard.process_bitmap(&bitmap, &overlay);
        });
    }

    pub fn submit_buffer(&self, data: Vec<u8>, metadata: FrameMetadata) {
        let processor = self.processor.clone();
        let overlay = self.overlay.clone();
        let stopped = self.stopped.clone();
        self.executor.submit(move || {
            let Ok(mut guard) = processor.lock() else {
                log::error!("processor lock poisoned; dropping buffer");
                return;
            };
            if stopped.load(Ordering::Acquire) {
                log::trace!("{}: stopped; skipping buffer", guard.name());
                return;
            }
            if let Err(err) = guard.process_buffer(&data, &metadata, &overlay) {
                log::warn!("{}: buffer frame not processed: {}", guard.name(), err);
            }
        });
    }

    /// If the work is skipped or dropped, the handle is released when the
    /// closure owning it is dropped.
    pub fn submit_image(&self, image: ImageProxy) {
        let processor = self.processor.clone();
        let overlay = self.overlay.clone();
        let stopped = self.stopped.clone();
        self.executor.submit(move || {
            let Ok(mut guard) = processor.lock() else {
                log::error!("processor lock poisoned; dropping image");
                return;
            };
            if stopped.load(Ordering::Acquire) {
                log::trace!("{}: stopped; skipping image", guard.name());
                return;
            }
            if let Err(err) = guard.process_image(image, &overlay) {
                log::warn!("{}: image frame not processed: {}", guard.name(), err);
            }
        });
    }

    pub fn overlay(&self) -> &Arc<GraphicOverlay> {
        &self.overlay
    }

    pub fn is_revoked(&self) -> bool {
        self.executor.is_revoked()
    }

    /// Revoke dispatch, then stop the processor. Idempotent.
    ///
    /// Blocks only while a frame that is already running holds the processor.
    /// A poisoned processor lock is still entered so `stop()` runs.
    pub fn shutdown(&self) {
        self.executor.revoke();
        let mut guard = self.processor.lock().unwrap_or_else(|poisoned| {
            log::warn!("processor lock poisoned; stopping anyway");
            poisoned.into_inner()
        });
        if !self.stopped.swap(true, Ordering::AcqRel) {
            guard.stop();
        }
    }
}
