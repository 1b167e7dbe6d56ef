use std::sync::Arc;

use tracing::{debug, info_span};

use crate::classify::ResultBuilder;
use crate::db::{NewInferenceRecord, PersistenceGateway};
use crate::ocr::OcrGateway;
use crate::parser::AnnotationParser;
use crate::storage::ObjectStore;
use crate::worker::detect_pool::DetectionHandle;
use crate::worker::job::TaskResult;

use super::context::TaskContext;
use super::error::TaskError;

/// The per-photo inference pipeline.
///
/// All collaborators are injected; the pipeline itself holds no mutable
/// state and is shared across the image workers of a batch.
pub struct TaskPipeline {
    ocr: Arc<dyn OcrGateway>,
    parser: AnnotationParser,
    detection: DetectionHandle,
    builder: ResultBuilder,
    store: Arc<dyn ObjectStore>,
    persistence: Arc<dyn PersistenceGateway>,
}

impl TaskPipeline {
    pub fn new(
        ocr: Arc<dyn OcrGateway>,
        parser: AnnotationParser,
        detection: DetectionHandle,
        store: Arc<dyn ObjectStore>,
        persistence: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self {
            ocr,
            parser,
            detection,
            builder: ResultBuilder,
            store,
            persistence,
        }
    }

    /// Runs the full pipeline for a single photo.
    /// Returns a (TaskResult, TaskContext) pair.
    pub fn run(&self, mut ctx: TaskContext) -> (TaskResult, TaskContext) {
        let _task_span = info_span!("image_task",
            job_id = %ctx.job.id,
            tenant = %ctx.job.tenant_id,
            batch = %ctx.job.batch_id,
            photo = %ctx.job.image_name(),
        )
        .entered();

        // Step 1: OCR annotation
        {
            let _step = info_span!("annotate").entered();
            if let Err(e) = self.step_annotate(&mut ctx) {
                return (TaskResult::failure(&ctx.job, e.to_string()), ctx);
            }
        }

        // Step 2: parse candidate ids
        {
            let _step = info_span!("parse").entered();
            self.step_parse(&mut ctx);
        }

        // Step 3: presence detection on the shared CPU pool
        {
            let _step = info_span!("detect").entered();
            if let Err(e) = self.step_detect(&mut ctx) {
                return (TaskResult::failure(&ctx.job, e.to_string()), ctx);
            }
        }

        // Step 4: classify into record drafts
        {
            let _step = info_span!("build").entered();
            self.step_build(&mut ctx);
        }

        // Step 5: upload the photo
        {
            let _step = info_span!("upload").entered();
            if let Err(e) = self.step_upload(&mut ctx) {
                return (TaskResult::failure(&ctx.job, e.to_string()), ctx);
            }
        }

        // Step 6: persist records
        {
            let _step = info_span!("persist").entered();
            if let Err(e) = self.step_persist(&mut ctx) {
                return (TaskResult::failure(&ctx.job, e.to_string()), ctx);
            }
        }

        let result = TaskResult::success(&ctx.job, ctx.records_created);
        (result, ctx)
    }

    fn step_annotate(&self, ctx: &mut TaskContext) -> Result<(), TaskError> {
        let tokens = self.ocr.annotate(&ctx.job.photo_path)?;
        ctx.tokens = Some(tokens);
        Ok(())
    }

    fn step_parse(&self, ctx: &mut TaskContext) {
        let tokens = ctx.tokens.as_ref().expect("step 1 completed");
        ctx.candidates = Some(self.parser.parse(tokens));
    }

    fn step_detect(&self, ctx: &mut TaskContext) -> Result<(), TaskError> {
        let candidates = ctx.candidates.as_ref().expect("step 2 completed");
        let detected = self.detection.detect(&ctx.job.photo_path, candidates)?;
        ctx.detected = Some(detected);
        Ok(())
    }

    fn step_build(&self, ctx: &mut TaskContext) {
        let candidates = ctx.candidates.as_ref().expect("step 2 completed");
        let detected = ctx.detected.expect("step 3 completed");
        ctx.drafts = Some(
            self.builder
                .build(&ctx.job.image_name(), candidates, detected),
        );
    }

    fn step_upload(&self, ctx: &mut TaskContext) -> Result<(), TaskError> {
        let stored = self.store.put(&ctx.job.photo_path)?;
        debug!(
            "Uploaded {} as {}",
            ctx.job.image_name(),
            stored.key
        );
        ctx.stored = Some(stored);
        Ok(())
    }

    fn step_persist(&self, ctx: &mut TaskContext) -> Result<(), TaskError> {
        let drafts = ctx.drafts.as_ref().expect("step 4 completed");
        let stored = ctx.stored.as_ref().expect("step 5 completed");

        for draft in drafts {
            self.persistence.create_record(NewInferenceRecord {
                image_name: draft.image_name.clone(),
                unique_id: draft.unique_id.clone(),
                vin_no: draft.vin.clone(),
                quantity: draft.quantity,
                exclusion: draft.exclusion.as_str().to_string(),
                photo_url: Some(stored.url.clone()),
                tenant_id: ctx.job.tenant_id.clone(),
                batch_id: Some(ctx.job.batch_id.clone()),
            })?;
            ctx.records_created += 1;
        }

        Ok(())
    }
}
