//! Batch lifecycle: Accepted → Processing → Cleaning → Done.

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{BatchOrchestrator, BatchSummary};
pub use scheduler::TenantScheduler;

use std::path::PathBuf;

/// One tenant's upload of photos, processed as a unit for cleanup purposes
/// only (persistence is per-record, never batch-atomic).
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub tenant_id: String,
    pub working_dir: PathBuf,
}

impl Batch {
    pub fn new(tenant_id: impl Into<String>, working_dir: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.into(),
            working_dir,
        }
    }
}

/// Sanitized `<name>_<uuid8>` directory name for staging an upload batch.
pub fn working_dir_name(batch_name: &str) -> String {
    let safe: String = batch_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim().replace(' ', "_");

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", safe, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_ids_are_unique() {
        let a = Batch::new("t1", PathBuf::from("/work/a"));
        let b = Batch::new("t1", PathBuf::from("/work/b"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_working_dir_name_sanitizes() {
        let name = working_dir_name("week 42: dock/north");
        let stem = &name[..name.len() - 9];

        assert_eq!(stem, "week_42__dock_north");
        assert!(!name.contains('/'));
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_working_dir_name_unique_suffix() {
        assert_ne!(working_dir_name("report"), working_dir_name("report"));
    }
}
