//! Shared CPU-bound detection pool.
//!
//! Detector inference is far heavier than the I/O work around it, so it runs
//! on its own small pool of workers shared by every batch. Image tasks
//! submit a request through a cloned [`DetectionHandle`] and block on a
//! per-request reply channel; a slow inference therefore occupies one
//! detection slot, never an I/O worker beyond the one waiting on it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::detection::DetectionAdapter;
use crate::error::DetectionError;
use crate::parser::CandidateId;

struct DetectRequest {
    photo_path: PathBuf,
    candidates: Vec<CandidateId>,
    reply: Sender<Result<bool, DetectionError>>,
}

pub struct DetectionPool {
    request_sender: Sender<DetectRequest>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

/// Cheap-clone submission side of the pool, held by every task pipeline.
#[derive(Clone)]
pub struct DetectionHandle {
    request_sender: Sender<DetectRequest>,
}

impl DetectionPool {
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(adapter: Arc<DetectionAdapter>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (request_sender, request_receiver) = bounded::<DetectRequest>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let request_rx = request_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_adapter = Arc::clone(&adapter);

            let handle = thread::spawn(move || {
                run_worker(worker_id, request_rx, shutdown_flag, worker_adapter);
            });

            workers.push(handle);
        }

        info!("Started {} detection workers", worker_count);

        Self {
            request_sender,
            workers,
            shutdown,
        }
    }

    pub fn handle(&self) -> DetectionHandle {
        DetectionHandle {
            request_sender: self.request_sender.clone(),
        }
    }

    pub fn shutdown(&self) {
        info!("Shutting down detection pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Drains the pool. Outstanding handles stop resolving once this
    /// returns; their `detect` calls yield [`DetectionError::PoolClosed`].
    pub fn wait(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        drop(self.request_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Detection worker {} panicked: {:?}", i, e);
            } else {
                debug!("Detection worker {} finished", i);
            }
        }

        info!("All detection workers have stopped");
    }
}

impl DetectionHandle {
    /// Runs presence detection on the shared pool, blocking until the
    /// verdict arrives.
    pub fn detect(
        &self,
        photo: &Path,
        candidates: &[CandidateId],
    ) -> Result<bool, DetectionError> {
        let (reply_tx, reply_rx) = bounded(1);

        self.request_sender
            .send(DetectRequest {
                photo_path: photo.to_path_buf(),
                candidates: candidates.to_vec(),
                reply: reply_tx,
            })
            .map_err(|_| DetectionError::PoolClosed)?;

        reply_rx.recv().map_err(|_| DetectionError::PoolClosed)?
    }
}

fn run_worker(
    worker_id: usize,
    request_receiver: Receiver<DetectRequest>,
    shutdown: Arc<AtomicBool>,
    adapter: Arc<DetectionAdapter>,
) {
    debug!("Detection worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Detection worker {} received shutdown signal", worker_id);
            break;
        }

        match request_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(request) => {
                debug!(
                    "Detection worker {} processing: {:?}",
                    worker_id, request.photo_path
                );

                let verdict = adapter.detect(&request.photo_path, &request.candidates);
                // The requester may have given up; nothing to do then.
                let _ = request.reply.send(verdict);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Detection worker {} request channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Detection worker {} stopped", worker_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection, VisionModel};
    use image::DynamicImage;

    struct AlwaysPresent;

    impl VisionModel for AlwaysPresent {
        fn infer(&self, _photo: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
            Ok(vec![Detection {
                label: "Chassis".to_string(),
                confidence: 0.95,
                bbox: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 200.0,
                    height: 100.0,
                },
            }])
        }
    }

    fn pool(workers: usize) -> DetectionPool {
        let adapter = Arc::new(DetectionAdapter::new(
            Arc::new(AlwaysPresent),
            0.5,
            "Chassis",
            5000.0,
        ));
        DetectionPool::new(adapter, workers)
    }

    fn test_photo(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("skid.png");
        DynamicImage::new_rgb8(8, 8).save(&path).unwrap();
        path
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let photo = test_photo(&dir);

        let pool = pool(2);
        let handle = pool.handle();

        assert!(handle.detect(&photo, &[]).unwrap());

        pool.wait();
    }

    #[test]
    fn test_concurrent_requests() {
        let dir = tempfile::tempdir().unwrap();
        let photo = test_photo(&dir);

        let pool = pool(2);
        let mut joins = Vec::new();

        for _ in 0..6 {
            let handle = pool.handle();
            let photo = photo.clone();
            joins.push(std::thread::spawn(move || handle.detect(&photo, &[])));
        }

        for join in joins {
            assert!(join.join().unwrap().unwrap());
        }

        pool.wait();
    }

    #[test]
    fn test_detect_after_wait_is_pool_closed() {
        let pool = pool(1);
        let handle = pool.handle();
        pool.wait();

        let result = handle.detect(Path::new("/tmp/whatever.jpg"), &[]);
        assert!(matches!(result, Err(DetectionError::PoolClosed)));
    }
}
