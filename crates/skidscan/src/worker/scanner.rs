use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::WorkerError;
use crate::worker::job::ImageJob;

/// File extensions admitted as batch photos.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Enumerates the photos of one batch's working directory.
pub struct BatchScanner {
    working_dir: PathBuf,
}

impl BatchScanner {
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// One [`ImageJob`] per recognized image file, top level only, ordered
    /// by file name so the sequence index is stable across runs.
    pub fn scan(&self, batch_id: &str, tenant_id: &str) -> Result<Vec<ImageJob>, WorkerError> {
        let mut photos = Vec::new();

        for entry in WalkDir::new(&self.working_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
        {
            let entry = entry.map_err(|e| WorkerError::ScanFailed {
                path: self.working_dir.clone(),
                source: e,
            })?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            if is_image_file(path) {
                debug!("Found photo: {}", path.display());
                photos.push(path.to_path_buf());
            }
        }

        photos.sort();

        let jobs: Vec<ImageJob> = photos
            .into_iter()
            .enumerate()
            .map(|(index, path)| ImageJob::new(path, batch_id, tenant_id, index))
            .collect();

        info!(
            "Scanned {} photos in {}",
            jobs.len(),
            self.working_dir.display()
        );
        Ok(jobs)
    }
}
