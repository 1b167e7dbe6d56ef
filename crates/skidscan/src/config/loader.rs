use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Validate version
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.workers.batch_workers == 0
        || config.workers.image_workers == 0
        || config.workers.detection_workers == 0
    {
        return Err(ConfigError::Validation {
            message: "Worker pool sizes must be greater than zero".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&config.detection.confidence_threshold) {
        return Err(ConfigError::Validation {
            message: format!(
                "Confidence threshold must be within [0, 1], got {}",
                config.detection.confidence_threshold
            ),
        });
    }

    if config.detection.min_box_area < 0.0 || config.parser.min_continuation_area < 0.0 {
        return Err(ConfigError::Validation {
            message: "Area thresholds must not be negative".to_string(),
        });
    }

    if config.detection.target_label.is_empty() {
        return Err(ConfigError::Validation {
            message: "Detection target label must not be empty".to_string(),
        });
    }

    Ok(())
}
