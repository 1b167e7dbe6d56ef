use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::StorageError;

use super::{ObjectStore, StoredObject};

const BASE_FOLDER: &str = "uploads";

/// Filesystem-backed [`ObjectStore`].
///
/// Keys are `uploads/uncompressed_<timestamp>_<uuid>_<name>`, unique per
/// upload, so no conflict resolution is needed.
pub struct FileObjectStore {
    root_directory: PathBuf,
    base_url: String,
}

impl FileObjectStore {
    pub fn new<P: AsRef<Path>>(root_directory: P, base_url: impl Into<String>) -> Self {
        Self {
            root_directory: root_directory.as_ref().to_path_buf(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &crate::config::StoreConfig) -> Self {
        Self::new(&config.root_directory, config.base_url.clone())
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

impl ObjectStore for FileObjectStore {
    fn put(&self, photo: &Path) -> Result<StoredObject, StorageError> {
        let timestamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
        let photo_name = photo
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo");

        let key = format!(
            "{}/uncompressed_{}_{}_{}",
            BASE_FOLDER,
            timestamp,
            Uuid::new_v4(),
            photo_name
        );

        let dest = self.root_directory.join(&key);
        if let Some(parent) = dest.parent() {
            self.ensure_directory(parent)?;
        }

        std::fs::copy(photo, &dest).map_err(|e| StorageError::CopyFile {
            from: photo.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        Ok(StoredObject { key, url })
    }
}
