use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

use vision_harness::{
    Bitmap, DetectorProcessor, Executor, FrameDispatcher, FrameMetadata, GraphicOverlay,
    ImageFormat, ImageProxy, MotionDetector, ProcessingFailure, ScopedExecutor, SharedProcessor,
    ThreadPoolExecutor, VisionProcessor, Work,
};

/// Delegate that holds work until the test decides to run it.
#[derive(Default)]
struct ManualExecutor {
    queue: Mutex<VecDeque<Work>>,
}

impl ManualExecutor {
    fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queue.lock().unwrap().pop_front();
            let Some(work) = next else {
                return ran;
            };
            work();
            ran += 1;
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, work: Work) {
        self.queue.lock().unwrap().push_back(work);
    }
}

fn record(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl FnOnce() + Send + 'static {
    let log = log.clone();
    move || log.lock().unwrap().push(name)
}

#[test]
fn only_work_admitted_and_started_before_revoke_runs() {
    let delegate = Arc::new(ManualExecutor::default());
    let scoped = ScopedExecutor::new(delegate.clone());
    let log = Arc::new(Mutex::new(Vec::new()));

    scoped.submit(record(&log, "a"));
    delegate.run_all();
    scoped.revoke();
    scoped.submit(record(&log, "b"));
    delegate.run_all();

    assert_eq!(*log.lock().unwrap(), vec!["a"]);
}

#[test]
fn queued_before_revoke_is_suppressed_regardless_of_latency() {
    let delegate = Arc::new(ManualExecutor::default());
    let scoped = ScopedExecutor::new(delegate.clone());
    let log = Arc::new(Mutex::new(Vec::new()));

    scoped.submit(record(&log, "a"));
    scoped.revoke();
    scoped.submit(record(&log, "b"));

    // Delegate runs its queue only after revoke.
    assert_eq!(delegate.run_all(), 1);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn every_submission_runs_exactly_once_without_revoke() {
    let pool = Arc::new(ThreadPoolExecutor::new(4).unwrap());
    let scoped = Arc::new(ScopedExecutor::new(pool.clone()));
    let counts: Arc<Vec<AtomicUsize>> = Arc::new((0..64).map(|_| AtomicUsize::new(0)).collect());

    let submitters: Vec<_> = (0..4)
        .map(|t| {
            let scoped = scoped.clone();
            let counts = counts.clone();
            std::thread::spawn(move || {
                for i in (t * 16)..(t * 16 + 16) {
                    let counts = counts.clone();
                    scoped.submit(move || {
                        counts[i].fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();
    for handle in submitters {
        handle.join().unwrap();
    }
    pool.shutdown().unwrap();

    assert!(counts.iter().all(|c| c.load(Ordering::SeqCst) == 1));
}

#[test]
fn revoke_from_another_thread_stops_later_submissions() {
    let pool = Arc::new(ThreadPoolExecutor::new(2).unwrap());
    let scoped = Arc::new(ScopedExecutor::new(pool.clone()));
    let ran_after = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(2));

    let revoker = {
        let scoped = scoped.clone();
        let barrier = barrier.clone();
        std::thread::spawn(move || {
            scoped.revoke();
            barrier.wait();
        })
    };
    barrier.wait();

    for _ in 0..100 {
        let ran_after = ran_after.clone();
        scoped.submit(move || {
            ran_after.fetch_add(1, Ordering::SeqCst);
        });
    }
    revoker.join().unwrap();
    pool.shutdown().unwrap();

    assert_eq!(ran_after.load(Ordering::SeqCst), 0);
}

#[test]
fn scoped_executor_substitutes_for_plain_executor() {
    fn run_on(executor: &dyn Executor, counter: &Arc<AtomicUsize>) {
        let counter = counter.clone();
        executor.execute(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    let delegate = Arc::new(ManualExecutor::default());
    let scoped = ScopedExecutor::new(delegate.clone());
    let counter = Arc::new(AtomicUsize::new(0));

    run_on(&scoped, &counter);
    delegate.run_all();
    scoped.revoke();
    run_on(&scoped, &counter);
    delegate.run_all();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn dispatcher_shutdown_skips_queued_frames_and_releases_handles() {
    let delegate = Arc::new(ManualExecutor::default());
    let processor: SharedProcessor = Arc::new(Mutex::new(
        DetectorProcessor::new(MotionDetector::new()).with_buffer_format(ImageFormat::Gray8),
    ));
    let overlay = Arc::new(GraphicOverlay::new());
    let dispatcher = FrameDispatcher::new(delegate.clone(), processor, overlay.clone());
    let released = Arc::new(AtomicUsize::new(0));
    let meta = FrameMetadata::builder().width(2).height(2).build();

    for pixel in [0u8, 255] {
        let released = released.clone();
        let image = ImageProxy::new(vec![pixel; 4], ImageFormat::Gray8, meta).with_release(
            move || {
                released.fetch_add(1, Ordering::SeqCst);
            },
        );
        dispatcher.submit_image(image);
    }
    dispatcher.shutdown();

    assert_eq!(delegate.run_all(), 2);
    assert_eq!(released.load(Ordering::SeqCst), 2);
    assert!(overlay.is_empty());
    assert_eq!(overlay.image_size(), None);
}

#[test]
fn dispatcher_detects_motion_on_worker_pool() {
    let pool = Arc::new(ThreadPoolExecutor::new(1).unwrap());
    let processor: SharedProcessor = Arc::new(Mutex::new(
        DetectorProcessor::new(MotionDetector::new()).with_buffer_format(ImageFormat::Gray8),
    ));
    let overlay = Arc::new(GraphicOverlay::new());
    let dispatcher = FrameDispatcher::new(pool.clone(), processor, overlay.clone());
    let meta = FrameMetadata::builder().width(2).height(2).rotation(90).build();

    dispatcher.submit_buffer(vec![0; 4], meta);
    dispatcher.submit_buffer(vec![255; 4], meta);
    pool.shutdown().unwrap();

    assert_eq!(overlay.len(), 1);
    assert_eq!(overlay.image_size(), Some((2, 2)));
}

#[derive(Default)]
struct CallLog {
    calls: AtomicUsize,
    calls_after_stop: AtomicUsize,
    stops: AtomicUsize,
}

/// Counts frames and whether any arrive after `stop()`; never fails.
struct RecordingProcessor {
    log: Arc<CallLog>,
    stopped: bool,
}

impl RecordingProcessor {
    fn record(&self) {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        if self.stopped {
            self.log.calls_after_stop.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl VisionProcessor for RecordingProcessor {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn process_bitmap(&mut self, _bitmap: &Bitmap, _overlay: &GraphicOverlay) {
        self.record();
    }

    fn process_buffer(
        &mut self,
        _data: &[u8],
        _metadata: &FrameMetadata,
        _overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure> {
        self.record();
        Ok(())
    }

    fn process_image(
        &mut self,
        image: ImageProxy,
        _overlay: &GraphicOverlay,
    ) -> Result<(), ProcessingFailure> {
        self.record();
        image.close();
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.log.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn frames_waiting_on_processor_never_run_after_shutdown() {
    let meta = FrameMetadata::builder().width(2).height(2).build();
    for _ in 0..200 {
        let log = Arc::new(CallLog::default());
        let processor: SharedProcessor = Arc::new(Mutex::new(RecordingProcessor {
            log: log.clone(),
            stopped: false,
        }));
        let pool = Arc::new(ThreadPoolExecutor::new(8).unwrap());
        let dispatcher =
            FrameDispatcher::new(pool.clone(), processor, Arc::new(GraphicOverlay::new()));

        for _ in 0..64 {
            dispatcher.submit_buffer(vec![0; 6], meta);
        }
        dispatcher.shutdown();
        dispatcher.submit_bitmap(Bitmap::new(2, 2));
        pool.shutdown().unwrap();

        assert_eq!(log.calls_after_stop.load(Ordering::SeqCst), 0);
        assert_eq!(log.stops.load(Ordering::SeqCst), 1);
        assert!(log.calls.load(Ordering::SeqCst) <= 64);
    }
}

