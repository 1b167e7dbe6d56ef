use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("OCR failed: {0}")]
    Ocr(#[from] crate::error::OcrError),

    #[error("Detection failed: {0}")]
    Detection(#[from] crate::error::DetectionError),

    #[error("Photo upload failed: {0}")]
    Upload(#[from] crate::error::StorageError),

    #[error("Record persistence failed: {0}")]
    Persistence(#[from] crate::db::DatabaseError),
}
