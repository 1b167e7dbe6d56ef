//! Detection collaborator boundary: confirms a physical item is present.
//!
//! The model call is a black box behind [`VisionModel`]; [`DetectionAdapter`]
//! applies the confidence, class-label and box-area filters on top of it.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use log::warn;
use tracing::debug;

use crate::error::DetectionError;
use crate::parser::CandidateId;

/// Axis-aligned detection box in photo pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// One raw detection as reported by the model.
#[derive(Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Boundary to the object-detection model.
pub trait VisionModel: Send + Sync {
    fn infer(&self, photo: &DynamicImage) -> Result<Vec<Detection>, DetectionError>;
}

/// Wraps the model call; the verdict depends on the photo alone.
pub struct DetectionAdapter {
    model: Arc<dyn VisionModel>,
    confidence_threshold: f32,
    target_label: String,
    min_box_area: f64,
}

impl DetectionAdapter {
    pub fn new(
        model: Arc<dyn VisionModel>,
        confidence_threshold: f32,
        target_label: impl Into<String>,
        min_box_area: f64,
    ) -> Self {
        Self {
            model,
            confidence_threshold,
            target_label: target_label.into(),
            min_box_area,
        }
    }

    pub fn from_config(
        model: Arc<dyn VisionModel>,
        config: &crate::config::DetectionConfig,
    ) -> Self {
        Self::new(
            model,
            config.confidence_threshold,
            config.target_label.clone(),
            config.min_box_area,
        )
    }

    /// Returns true when at least one detection of the target class is
    /// confident enough and large enough. A photo that fails to load is
    /// reported as not detected, not as an error.
    ///
    /// `candidates` is accepted for traceability only and never consulted.
    pub fn detect(
        &self,
        photo: &Path,
        candidates: &[CandidateId],
    ) -> Result<bool, DetectionError> {
        debug!(
            photo = %photo.display(),
            candidates = candidates.len(),
            "running presence detection"
        );

        let photo_image = match image::open(photo) {
            Ok(img) => img,
            Err(e) => {
                warn!("Could not load '{}' for detection: {}", photo.display(), e);
                return Ok(false);
            }
        };

        let detections = self.model.infer(&photo_image)?;

        Ok(detections.iter().any(|d| {
            d.confidence > self.confidence_threshold
                && d.label == self.target_label
                && d.bbox.area() > self.min_box_area
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedModel {
        detections: Vec<Detection>,
    }

    impl VisionModel for FixedModel {
        fn infer(&self, _photo: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
            Ok(self.detections.clone())
        }
    }

    struct FailingModel;

    impl VisionModel for FailingModel {
        fn infer(&self, _photo: &DynamicImage) -> Result<Vec<Detection>, DetectionError> {
            Err(DetectionError::Inference("model crashed".to_string()))
        }
    }

    fn detection(label: &str, confidence: f32, width: f64, height: f64) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: BoundingBox {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
        }
    }

    fn adapter(detections: Vec<Detection>) -> DetectionAdapter {
        DetectionAdapter::new(Arc::new(FixedModel { detections }), 0.5, "Chassis", 5000.0)
    }

    fn test_photo() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skid.png");
        let img = image::DynamicImage::new_rgb8(8, 8);
        img.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn test_qualifying_detection_is_present() {
        let (_dir, photo) = test_photo();
        let adapter = adapter(vec![detection("Chassis", 0.9, 200.0, 100.0)]);

        assert!(adapter.detect(&photo, &[]).unwrap());
    }

    #[test]
    fn test_low_confidence_filtered() {
        let (_dir, photo) = test_photo();
        let adapter = adapter(vec![detection("Chassis", 0.3, 200.0, 100.0)]);

        assert!(!adapter.detect(&photo, &[]).unwrap());
    }

    #[test]
    fn test_wrong_label_filtered() {
        let (_dir, photo) = test_photo();
        let adapter = adapter(vec![detection("Forklift", 0.9, 200.0, 100.0)]);

        assert!(!adapter.detect(&photo, &[]).unwrap());
    }

    #[test]
    fn test_small_box_filtered() {
        // Confident and correctly labelled, but too distant/partial.
        let (_dir, photo) = test_photo();
        let adapter = adapter(vec![detection("Chassis", 0.9, 40.0, 40.0)]);

        assert!(!adapter.detect(&photo, &[]).unwrap());
    }

    #[test]
    fn test_any_qualifying_detection_suffices() {
        let (_dir, photo) = test_photo();
        let adapter = adapter(vec![
            detection("Forklift", 0.9, 200.0, 100.0),
            detection("Chassis", 0.2, 200.0, 100.0),
            detection("Chassis", 0.8, 300.0, 100.0),
        ]);

        assert!(adapter.detect(&photo, &[]).unwrap());
    }

    #[test]
    fn test_unreadable_photo_is_not_detected() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not_an_image.jpg");
        std::fs::write(&bogus, b"garbage").unwrap();

        let adapter = adapter(vec![detection("Chassis", 0.9, 200.0, 100.0)]);
        assert!(!adapter.detect(&bogus, &[]).unwrap());
    }

    #[test]
    fn test_missing_photo_is_not_detected() {
        let adapter = adapter(vec![]);
        assert!(!adapter
            .detect(Path::new("/nonexistent/skid.jpg"), &[])
            .unwrap());
    }

    #[test]
    fn test_model_failure_propagates() {
        let (_dir, photo) = test_photo();
        let adapter = DetectionAdapter::new(Arc::new(FailingModel), 0.5, "Chassis", 5000.0);

        assert!(matches!(
            adapter.detect(&photo, &[]),
            Err(DetectionError::Inference(_))
        ));
    }
}
