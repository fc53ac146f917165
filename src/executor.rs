//! Task execution facilities.
//!
//! - `Executor`: anything that accepts a unit of work and arranges for it to run.
//! - `InlineExecutor`: runs work on the calling thread.
//! - `ThreadPoolExecutor`: fixed pool of worker threads fed by a shared queue.
//! - `ScopedExecutor`: wraps a delegate and adds one-way revocation.
//!
//! `ScopedExecutor` performs two admission checks against its revoked flag:
//! once when work is submitted, and again when the delegate starts running it.
//! Work that is already running when `revoke()` is called is never interrupted.

use anyhow::{anyhow, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// A zero-argument unit of work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Accepts units of work for (possibly asynchronous) execution.
///
/// Implementations decide when, where and in which order work runs.
pub trait Executor: Send + Sync {
    fn execute(&self, work: Work);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, work: Work) {
        (**self).execute(work)
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, work: Work) {
        (**self).execute(work)
    }
}

// ----------------------------------------------------------------------------
// InlineExecutor
// ----------------------------------------------------------------------------

/// Runs each unit of work immediately on the submitting thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, work: Work) {
        work()
    }
}

// ----------------------------------------------------------------------------
// ThreadPoolExecutor
// ----------------------------------------------------------------------------

/// Fixed-size pool of named worker threads.
///
/// Workers pull from a single FIFO queue, so work starts in submission order
/// but may complete in any order once more than one worker is running.
pub struct ThreadPoolExecutor {
    sender: Mutex<Option<Sender<Work>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolExecutor {
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_name("vision-worker", workers)
    }

    pub fn with_name(name: &str, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(anyhow!("thread pool needs at least one worker"));
        }
        let (sender, receiver) = mpsc::channel::<Work>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let receiver = receiver.clone();
            let handle = std::thread::Builder::new()
                .name(format!("{name}-{idx}"))
                .spawn(move || worker_loop(receiver))
                .map_err(|e| anyhow!("failed to spawn worker {}: {}", idx, e))?;
            handles.push(handle);
        }
        log::debug!("thread pool '{}' started with {} workers", name, workers);
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
        })
    }

    /// Close the queue and join all workers. Already queued work drains first.
    pub fn shutdown(&self) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| anyhow!("thread pool sender lock poisoned"))?
            .take();
        drop(sender);

        let handles = std::mem::take(
            &mut *self
                .workers
                .lock()
                .map_err(|_| anyhow!("thread pool worker lock poisoned"))?,
        );
        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow!("thread pool worker panicked"))?;
        }
        Ok(())
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, work: Work) {
        let guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::error!("thread pool sender lock poisoned; dropping work");
                return;
            }
        };
        match guard.as_ref() {
            Some(sender) => {
                if sender.send(work).is_err() {
                    log::warn!("thread pool queue closed; dropping work");
                }
            }
            None => log::warn!("thread pool already shut down; dropping work"),
        }
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::error!("thread pool shutdown failed: {}", err);
        }
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Work>>>) {
    loop {
        // Hold the lock only while dequeuing.
        let next = match receiver.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => {
                log::error!("thread pool queue lock poisoned; worker exiting");
                return;
            }
        };
        let Ok(work) = next else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(work)).is_err() {
            log::error!("unit of work panicked on thread pool worker");
        }
    }
}

// ----------------------------------------------------------------------------
// ScopedExecutor: revocable wrapper
// ----------------------------------------------------------------------------

/// Wraps a delegate executor so that dispatch can be permanently disabled.
///
/// After [`revoke`](Self::revoke):
/// - new submissions are dropped without reaching the delegate;
/// - work still queued in the delegate is skipped when it starts;
/// - work already running completes normally.
///
/// The delegate is shared, not owned: revoking does not shut it down, and it
/// can keep serving other callers.
pub struct ScopedExecutor<E: Executor + ?Sized> {
    delegate: Arc<E>,
    revoked: Arc<AtomicBool>,
}

impl<E: Executor + ?Sized> ScopedExecutor<E> {
    pub fn new(delegate: Arc<E>) -> Self {
        Self {
            delegate,
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Forward `work` to the delegate unless this executor has been revoked.
    pub fn submit<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.revoked.load(Ordering::Acquire) {
            log::trace!("scoped executor revoked; dropping work at submit");
            return;
        }
        let revoked = self.revoked.clone();
        self.delegate.execute(Box::new(move || {
            // Re-check: revoke() may have happened while this sat in the queue.
            if revoked.load(Ordering::Acquire) {
                log::trace!("scoped executor revoked; skipping queued work");
                return;
            }
            work();
        }));
    }

    /// Permanently disable this executor. Idempotent; never blocks.
    pub fn revoke(&self) {
        if !self.revoked.swap(true, Ordering::AcqRel) {
            log::debug!("scoped executor revoked");
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    pub fn delegate(&self) -> &Arc<E> {
        &self.delegate
    }
}

impl<E: Executor + ?Sized> Executor for ScopedExecutor<E> {
    fn execute(&self, work: Work) {
        self.submit(work)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
