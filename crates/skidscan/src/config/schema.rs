use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub database_path: String,
    pub store: StoreConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub root_directory: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "file://".to_string()
}

/// Sizes of the three bounded pools: cross-tenant batches, per-batch image
/// tasks (I/O-bound) and the shared detection workers (CPU-bound).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_batch_workers")]
    pub batch_workers: usize,
    #[serde(default = "default_image_workers")]
    pub image_workers: usize,
    #[serde(default = "default_detection_workers")]
    pub detection_workers: usize,
}

fn default_batch_workers() -> usize {
    4
}

fn default_image_workers() -> usize {
    num_cpus::get()
}

fn default_detection_workers() -> usize {
    (num_cpus::get() / 2).max(1)
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_workers: default_batch_workers(),
            image_workers: default_image_workers(),
            detection_workers: default_detection_workers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            dpi: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_target_label")]
    pub target_label: String,
    /// Minimum detection-box area in square pixels; smaller boxes are
    /// treated as distant or partial objects.
    #[serde(default = "default_min_box_area")]
    pub min_box_area: f64,
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_target_label() -> String {
    "Chassis".to_string()
}

fn default_min_box_area() -> f64 {
    5000.0
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            target_label: default_target_label(),
            min_box_area: default_min_box_area(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Minimum token-region area for the `@`-continuation path.
    #[serde(default = "default_min_continuation_area")]
    pub min_continuation_area: f64,
}

fn default_min_continuation_area() -> f64 {
    100.0
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_continuation_area: default_min_continuation_area(),
        }
    }
}
