//! Concurrent processing of independent frames.

use image::RgbaImage;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, warn};

use crate::detection::{DetectionOutput, SquareDetector};
use crate::error::Result;

/// A frame queued for detection
pub struct Frame {
    pub label: String,
    pub image: Arc<RgbaImage>,
}

impl Frame {
    pub fn new(label: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            label: label.into(),
            image: Arc::new(image),
        }
    }
}

/// Result for one frame of a batch
pub struct FrameOutcome {
    pub label: String,
    pub output: Result<DetectionOutput>,
}

/// Work item: frame plus its position in the batch
struct WorkItem {
    index: usize,
    frame: Frame,
}

/// Runs a detector over many frames on a fixed pool of worker threads.
///
/// Work is distributed through an MPSC channel; each frame owns its buffers,
/// so workers share nothing but the detector.
pub struct BatchExecutor {
    detector: Arc<SquareDetector>,
    workers: usize,
}

impl BatchExecutor {
    pub fn new(detector: Arc<SquareDetector>, workers: usize) -> Self {
        Self {
            detector,
            workers: workers.max(1),
        }
    }

    /// Process all frames. Outcomes come back in input order; a failed frame
    /// does not stop the others.
    pub fn execute(&self, frames: Vec<Frame>) -> Vec<FrameOutcome> {
        let total = frames.len();
        if total == 0 {
            return Vec::new();
        }

        let (work_tx, work_rx): (Sender<WorkItem>, Receiver<WorkItem>) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel::<(usize, FrameOutcome)>();

        for (index, frame) in frames.into_iter().enumerate() {
            // The receiver is alive until the workers finish, so this cannot fail.
            if work_tx.send(WorkItem { index, frame }).is_err() {
                warn!("Work queue closed before all frames were queued");
                break;
            }
        }
        drop(work_tx);

        let work_rx = Mutex::new(work_rx);
        let worker_count = self.workers.min(total);
        debug!(frames = total, workers = worker_count, "Starting batch");

        thread::scope(|scope| {
            for worker in 0..worker_count {
                let work_rx = &work_rx;
                let result_tx = result_tx.clone();
                let detector = Arc::clone(&self.detector);
                scope.spawn(move || {
                    loop {
                        let next = match work_rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let Ok(item) = next else { break };

                        debug!(worker, frame = %item.frame.label, "Processing frame");
                        let output = detector.detect_frame(&item.frame.label, item.frame.image);
                        let outcome = FrameOutcome {
                            label: item.frame.label,
                            output,
                        };
                        if result_tx.send((item.index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut outcomes: Vec<(usize, FrameOutcome)> = result_rx.into_iter().collect();
        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
