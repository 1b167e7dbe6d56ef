//! Cross-tenant batch scheduler.
//!
//! Bounds how many batches run their full pipeline concurrently, so a burst
//! of uploads from many tenants degrades to queueing instead of unbounded
//! OCR, detector and database pressure.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;

use super::orchestrator::BatchOrchestrator;
use super::Batch;

pub struct TenantScheduler {
    batch_sender: Sender<Batch>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TenantScheduler {
    /// # Panics
    /// Panics if `batch_workers` is 0.
    pub fn new(orchestrator: Arc<BatchOrchestrator>, batch_workers: usize) -> Self {
        assert!(batch_workers > 0, "batch_workers must be > 0");
        let (batch_sender, batch_receiver) = bounded::<Batch>(batch_workers * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(batch_workers);

        for worker_id in 0..batch_workers {
            let batch_rx = batch_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_orchestrator = Arc::clone(&orchestrator);

            let handle = thread::spawn(move || {
                run_worker(worker_id, batch_rx, shutdown_flag, worker_orchestrator);
            });

            workers.push(handle);
        }

        info!("Started {} batch workers", batch_workers);

        Self {
            batch_sender,
            workers,
            shutdown,
        }
    }

    /// Accepts a batch for asynchronous processing and returns its id.
    /// Completion (and any failure) is visible only through logs and the
    /// persisted records; blocks only while the intake queue is full.
    pub fn submit_batch(
        &self,
        tenant_id: &str,
        working_dir: PathBuf,
    ) -> Result<String, WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        let batch = Batch::new(tenant_id, working_dir);
        let batch_id = batch.id.clone();

        info!(
            "Tenant {}: batch {} submitted for processing",
            tenant_id, batch_id
        );

        self.batch_sender
            .send(batch)
            .map_err(|_| WorkerError::ChannelClosed)?;
        Ok(batch_id)
    }

    pub fn shutdown(&self) {
        info!("Shutting down tenant scheduler...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Drains queued batches and joins every batch worker.
    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.batch_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Batch worker {} panicked: {:?}", i, e);
            } else {
                debug!("Batch worker {} finished", i);
            }
        }

        info!("All batch workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    batch_receiver: Receiver<Batch>,
    shutdown: Arc<AtomicBool>,
    orchestrator: Arc<BatchOrchestrator>,
) {
    debug!("Batch worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Batch worker {} received shutdown signal", worker_id);
            break;
        }

        match batch_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(batch) => {
                debug!("Batch worker {} processing batch {}", worker_id, batch.id);
                orchestrator.run(&batch);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Batch worker {} channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Batch worker {} stopped", worker_id);
}
