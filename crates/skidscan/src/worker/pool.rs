//! Bounded I/O worker pool for one batch's image tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::pipeline::{TaskContext, TaskPipeline};
use crate::worker::job::{ImageJob, TaskResult};

pub struct ImagePool {
    job_sender: Sender<ImageJob>,
    result_receiver: Receiver<TaskResult>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl ImagePool {
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(pipeline: Arc<TaskPipeline>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<ImageJob>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<TaskResult>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_pipeline = Arc::clone(&pipeline);

            let handle = thread::spawn(move || {
                run_worker(worker_id, job_rx, result_tx, shutdown_flag, worker_pipeline);
            });

            workers.push(handle);
        }

        info!("Started {} image workers", worker_count);

        Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        }
    }

    pub fn submit(&self, job: ImageJob) -> Result<(), crate::error::WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(crate::error::WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| crate::error::WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<TaskResult> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<TaskResult> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down image pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Image worker {} panicked: {:?}", i, e);
            } else {
                debug!("Image worker {} finished", i);
            }
        }

        info!("All image workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<ImageJob>,
    result_sender: Sender<TaskResult>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<TaskPipeline>,
) {
    debug!("Image worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Image worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!(
                    "Image worker {} processing job: {:?}",
                    worker_id, job.photo_path
                );

                let ctx = TaskContext::new(job);
                let (result, _ctx) = pipeline.run(ctx);

                if let Err(e) = result_sender.send(result) {
                    error!("Image worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Image worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Image worker {} stopped", worker_id);
}
