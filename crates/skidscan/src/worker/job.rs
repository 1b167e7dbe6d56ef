use std::path::PathBuf;

/// The unit of work: one photo belonging to one tenant's batch.
#[derive(Debug, Clone)]
pub struct ImageJob {
    pub id: String,
    pub photo_path: PathBuf,
    pub batch_id: String,
    pub tenant_id: String,
    /// Position within the batch's scan order.
    pub index: usize,
}

impl ImageJob {
    pub fn new(
        photo_path: PathBuf,
        batch_id: impl Into<String>,
        tenant_id: impl Into<String>,
        index: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            photo_path,
            batch_id: batch_id.into(),
            tenant_id: tenant_id.into(),
            index,
        }
    }

    /// The photo's file name, for logging and the persisted record.
    pub fn image_name(&self) -> String {
        self.photo_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Terminal outcome of one image task. Tasks are never retried.
#[derive(Debug)]
pub struct TaskResult {
    pub job_id: String,
    pub photo_path: PathBuf,
    pub batch_id: String,
    pub tenant_id: String,
    pub success: bool,
    pub records_created: usize,
    pub error: Option<String>,
}

impl TaskResult {
    pub fn success(job: &ImageJob, records_created: usize) -> Self {
        Self {
            job_id: job.id.clone(),
            photo_path: job.photo_path.clone(),
            batch_id: job.batch_id.clone(),
            tenant_id: job.tenant_id.clone(),
            success: true,
            records_created,
            error: None,
        }
    }

    pub fn failure(job: &ImageJob, error: String) -> Self {
        Self {
            job_id: job.id.clone(),
            photo_path: job.photo_path.clone(),
            batch_id: job.batch_id.clone(),
            tenant_id: job.tenant_id.clone(),
            success: false,
            records_created: 0,
            error: Some(error),
        }
    }
}
