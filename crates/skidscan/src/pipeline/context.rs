use crate::classify::RecordDraft;
use crate::ocr::TextToken;
use crate::parser::CandidateId;
use crate::storage::StoredObject;
use crate::worker::job::ImageJob;

pub struct TaskContext {
    // Input
    pub job: ImageJob,

    // Step 1 result — guaranteed Some after step_annotate
    pub tokens: Option<Vec<TextToken>>,

    // Step 2 result — guaranteed Some after step_parse
    pub candidates: Option<Vec<CandidateId>>,

    // Step 3 result — guaranteed Some after step_detect
    pub detected: Option<bool>,

    // Step 4 result — guaranteed Some after step_build
    pub drafts: Option<Vec<RecordDraft>>,

    // Step 5 result — guaranteed Some after step_upload
    pub stored: Option<StoredObject>,

    // Step 6 result
    pub records_created: usize,
}

impl TaskContext {
    pub fn new(job: ImageJob) -> Self {
        Self {
            job,
            tokens: None,
            candidates: None,
            detected: None,
            drafts: None,
            stored: None,
            records_created: 0,
        }
    }
}
