use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkidscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Allocator error: {0}")]
    Allocator(#[from] AllocatorError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to read photo '{path}': {source}")]
    ReadPhoto {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode photo: {0}")]
    DecodeImage(String),

    #[error("Failed to initialize OCR engine: {0}")]
    EngineInit(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),
}

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Detector inference failed: {0}")]
    Inference(String),

    #[error("Detection pool closed")]
    PoolClosed,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum AllocatorError {
    #[error("Last issued id '{0}' does not match the label grammar")]
    MalformedId(String),

    #[error("Unique-id space exhausted at '{0}'")]
    SequenceExhausted(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

pub type Result<T> = std::result::Result<T, SkidscanError>;
