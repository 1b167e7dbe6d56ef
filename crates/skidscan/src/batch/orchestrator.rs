use std::sync::Arc;

use log::{error, info, warn};
use tracing::info_span;

use crate::db::PersistenceGateway;
use crate::pipeline::TaskPipeline;
use crate::worker::{BatchScanner, ImagePool};

use super::Batch;

/// Terminal accounting for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records_created: usize,
}

/// Runs every image task of one batch, then removes the batch's working
/// directory exactly once, whatever the per-task outcomes were.
pub struct BatchOrchestrator {
    pipeline: Arc<TaskPipeline>,
    persistence: Arc<dyn PersistenceGateway>,
    image_workers: usize,
}

impl BatchOrchestrator {
    pub fn new(
        pipeline: Arc<TaskPipeline>,
        persistence: Arc<dyn PersistenceGateway>,
        image_workers: usize,
    ) -> Self {
        assert!(image_workers > 0, "image_workers must be > 0");
        Self {
            pipeline,
            persistence,
            image_workers,
        }
    }

    /// Processes one batch to completion. Per-task failures are logged and
    /// counted, never propagated; the working directory is removed even when
    /// every task failed.
    pub fn run(&self, batch: &Batch) -> BatchSummary {
        let _batch_span = info_span!("batch",
            batch = %batch.id,
            tenant = %batch.tenant_id,
        )
        .entered();

        if let Err(e) = self.persistence.create_batch(
            &batch.id,
            &batch.tenant_id,
            &batch.working_dir.to_string_lossy(),
        ) {
            warn!("Could not register batch {}: {}", batch.id, e);
        }

        let jobs = match BatchScanner::new(&batch.working_dir).scan(&batch.id, &batch.tenant_id)
        {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Batch {} scan failed: {}", batch.id, e);
                Vec::new()
            }
        };

        let total = jobs.len();
        let mut summary = BatchSummary {
            batch_id: batch.id.clone(),
            total,
            succeeded: 0,
            failed: 0,
            records_created: 0,
        };

        if jobs.is_empty() {
            info!("Batch {} has no photos, completing as no-op", batch.id);
            self.clean(batch);
            return summary;
        }

        let pool = ImagePool::new(Arc::clone(&self.pipeline), self.image_workers);

        let mut submitted = 0;
        for job in jobs {
            let photo = job.image_name();
            match pool.submit(job) {
                Ok(()) => submitted += 1,
                Err(e) => {
                    error!(
                        "Batch {} could not submit '{}': {}",
                        batch.id, photo, e
                    );
                    summary.failed += 1;
                }
            }
        }

        for _ in 0..submitted {
            match pool.recv_result() {
                Some(result) => {
                    if result.success {
                        summary.succeeded += 1;
                        summary.records_created += result.records_created;
                    } else {
                        summary.failed += 1;
                        error!(
                            "Task failed (tenant {}, batch {}, photo {}): {}",
                            result.tenant_id,
                            result.batch_id,
                            result.photo_path.display(),
                            result.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                None => {
                    // Workers died without reporting; account the remainder
                    // as failed so the batch still reaches Cleaning.
                    error!("Batch {} result channel closed early", batch.id);
                    summary.failed = total - summary.succeeded;
                    break;
                }
            }
        }

        // Drain the batch's pool before entering Cleaning.
        pool.wait();

        self.clean(batch);

        info!(
            "Batch {} done: {}/{} tasks succeeded, {} records",
            batch.id, summary.succeeded, summary.total, summary.records_created
        );

        summary
    }

    /// Cleaning state: the working directory is removed unconditionally;
    /// a removal failure is logged, never fatal.
    fn clean(&self, batch: &Batch) {
        match std::fs::remove_dir_all(&batch.working_dir) {
            Ok(()) => info!(
                "Removed working directory {}",
                batch.working_dir.display()
            ),
            Err(e) => warn!(
                "Could not remove working directory {}: {}",
                batch.working_dir.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use crate::db::{Database, SqliteGateway};
    use crate::detection::{BoundingBox, Detection, DetectionAdapter, VisionModel};
    use crate::error::{DetectionError, OcrError};
    use crate::ocr::{BoundingRegion, OcrGateway, TextToken};
    use crate::parser::AnnotationParser;
    use crate::storage::FileObjectStore;
    use crate::worker::DetectionPool;

    /// OCR stub keyed on file names: `fail` anywhere in the name raises,
    /// `blank` yields no tokens, anything else yields one label.
    struct NameKeyedOcr;

    impl OcrGateway for NameKeyedOcr {
        fn annotate(&self, photo: &Path) -> Result<Vec<TextToken>, OcrError> {
            let name = photo.file_name().unwrap().to_string_lossy();
            if name.contains("fail") {
                return Err(OcrError::Recognition("simulated outage".to_string()));
            }
            if name.contains("blank") {
                return Ok(vec![]);
            }
            Ok(vec![TextToken::new(
                "@AB1234",
                BoundingRegion::rect(0.0, 0.0, 60.0, 20.0),
            )])
        }
    }

    struct PresentModel;

    impl VisionModel for PresentModel {
        fn infer(
            &self,
            _photo: &image::DynamicImage,
        ) -> Result<Vec<Detection>, DetectionError> {
            Ok(vec![Detection {
                label: "Chassis".to_string(),
                confidence: 0.9,
                bbox: BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 200.0,
                    height: 100.0,
                },
            }])
        }
    }

    struct Fixture {
        _store_dir: tempfile::TempDir,
        gateway: Arc<SqliteGateway>,
        orchestrator: BatchOrchestrator,
        detection_pool: DetectionPool,
    }

    fn fixture() -> Fixture {
        let store_dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(SqliteGateway::new(Database::open_in_memory().unwrap()));

        let detection_pool = DetectionPool::new(
            Arc::new(DetectionAdapter::new(
                Arc::new(PresentModel),
                0.5,
                "Chassis",
                5000.0,
            )),
            2,
        );

        let pipeline = Arc::new(TaskPipeline::new(
            Arc::new(NameKeyedOcr),
            AnnotationParser::new(100.0),
            detection_pool.handle(),
            Arc::new(FileObjectStore::new(store_dir.path(), "file://store")),
            Arc::clone(&gateway) as Arc<dyn PersistenceGateway>,
        ));

        let orchestrator = BatchOrchestrator::new(
            pipeline,
            Arc::clone(&gateway) as Arc<dyn PersistenceGateway>,
            3,
        );

        Fixture {
            _store_dir: store_dir,
            gateway,
            orchestrator,
            detection_pool,
        }
    }

    fn working_dir_with(photos: &[&str]) -> (tempfile::TempDir, PathBuf) {
        let parent = tempfile::tempdir().unwrap();
        let dir = parent.path().join("batch_work");
        std::fs::create_dir(&dir).unwrap();
        for name in photos {
            let path = dir.join(name);
            image::DynamicImage::new_rgb8(8, 8).save(&path).unwrap();
        }
        (parent, dir)
    }

    #[test]
    fn test_partial_failure_tolerated_and_directory_removed() {
        let f = fixture();
        let (_parent, dir) = working_dir_with(&[
            "skid_1.png",
            "skid_2.png",
            "skid_3_fail.png",
            "skid_4.png",
            "skid_5.png",
        ]);

        let batch = Batch::new("t1", dir.clone());
        let summary = f.orchestrator.run(&batch);

        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records_created, 4);

        // The failed photo contributed zero records.
        let rows = f.gateway.records_for_batch(&batch.id).unwrap();
        assert_eq!(rows.len(), 4);

        // Working directory removed despite the failure.
        assert!(!dir.exists());

        f.detection_pool.wait();
    }

    #[test]
    fn test_empty_batch_is_noop_success_with_cleanup() {
        let f = fixture();
        let (_parent, dir) = working_dir_with(&[]);
        std::fs::write(dir.join("notes.txt"), b"not a photo").unwrap();

        let batch = Batch::new("t1", dir.clone());
        let summary = f.orchestrator.run(&batch);

        assert_eq!(summary.total, 0);
        assert_eq!(summary.succeeded, 0);
        assert!(!dir.exists());

        f.detection_pool.wait();
    }

    #[test]
    fn test_all_tasks_failing_still_cleans_up() {
        let f = fixture();
        let (_parent, dir) = working_dir_with(&["fail_1.png", "fail_2.png"]);

        let batch = Batch::new("t1", dir.clone());
        let summary = f.orchestrator.run(&batch);

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.records_created, 0);
        assert!(!dir.exists());
        assert!(f.gateway.records_for_batch(&batch.id).unwrap().is_empty());

        f.detection_pool.wait();
    }

    #[test]
    fn test_missing_working_dir_completes_without_panicking() {
        let f = fixture();
        let batch = Batch::new("t1", PathBuf::from("/nonexistent/batch_work"));

        let summary = f.orchestrator.run(&batch);
        assert_eq!(summary.total, 0);

        f.detection_pool.wait();
    }

    #[test]
    fn test_batch_row_registered() {
        let f = fixture();
        let (_parent, dir) = working_dir_with(&["skid.png"]);

        let batch = Batch::new("t7", dir);
        f.orchestrator.run(&batch);

        // The batches table has the row; records reference the batch id.
        let rows = f.gateway.records_for_batch(&batch.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tenant_id, "t7");

        f.detection_pool.wait();
    }
}
