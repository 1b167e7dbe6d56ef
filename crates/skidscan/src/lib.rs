pub mod allocator;
pub mod batch;
pub mod classify;
pub mod config;
pub mod db;
pub mod detection;
pub mod error;
pub mod logging;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod worker;

pub use allocator::UniqueIdAllocator;
pub use batch::{working_dir_name, Batch, BatchOrchestrator, BatchSummary, TenantScheduler};
pub use classify::{ExclusionStatus, RecordDraft, ResultBuilder};
pub use config::{load_config, Config};
pub use db::{Database, PersistenceGateway, SqliteGateway};
pub use detection::{Detection, DetectionAdapter, VisionModel};
pub use error::{
    AllocatorError, ConfigError, DetectionError, OcrError, Result, SkidscanError, StorageError,
    WorkerError,
};
pub use ocr::{OcrGateway, TesseractOcr, TextToken};
pub use parser::{AnnotationParser, CandidateId};
pub use pipeline::TaskPipeline;
pub use storage::{FileObjectStore, ObjectStore};
pub use worker::{DetectionPool, ImagePool};
