//! Result builder: combines parser output and the detection verdict into
//! record drafts with an exclusion status.

use log::debug;

use crate::parser::CandidateId;

/// Why a photo did or did not yield a normal inventory record.
///
/// The set is exhaustive and mutually exclusive. `MultipleStickers` and
/// `Other` are never produced by [`ResultBuilder`] any more, but remain part
/// of the schema: persisted rows from earlier revisions carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionStatus {
    Filled,
    EmptySkid,
    StickerNotFound,
    MultipleStickers,
    Other,
}

impl ExclusionStatus {
    /// The persisted representation. A filled record stores the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionStatus::Filled => "",
            ExclusionStatus::EmptySkid => "Empty Skid",
            ExclusionStatus::StickerNotFound => "Sticker not found",
            ExclusionStatus::MultipleStickers => "Multiple stickers detected",
            ExclusionStatus::Other => "Other",
        }
    }
}

/// An inference record before storage/persistence details are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub image_name: String,
    pub unique_id: Option<String>,
    pub vin: Option<String>,
    pub quantity: Option<u32>,
    pub exclusion: ExclusionStatus,
}

impl RecordDraft {
    fn empty(image_name: &str, exclusion: ExclusionStatus) -> Self {
        Self {
            image_name: image_name.to_string(),
            unique_id: None,
            vin: None,
            quantity: None,
            exclusion,
        }
    }
}

pub struct ResultBuilder;

impl ResultBuilder {
    /// Classifies one photo. Always yields exactly one draft: when several
    /// candidates qualify, only the first in scan order is reported and the
    /// rest are dropped.
    pub fn build(
        &self,
        image_name: &str,
        candidates: &[CandidateId],
        detected: bool,
    ) -> Vec<RecordDraft> {
        if !detected {
            return vec![RecordDraft::empty(image_name, ExclusionStatus::EmptySkid)];
        }

        let Some(first) = candidates.first() else {
            return vec![RecordDraft::empty(image_name, ExclusionStatus::StickerNotFound)];
        };

        if candidates.len() > 1 {
            debug!(
                "{}: {} candidate ids recognized, reporting only '{}'",
                image_name,
                candidates.len(),
                first.value
            );
        }

        vec![RecordDraft {
            image_name: image_name.to_string(),
            unique_id: Some(first.value.clone()),
            vin: None,
            quantity: Some(1),
            exclusion: ExclusionStatus::Filled,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(value: &str) -> CandidateId {
        CandidateId {
            value: value.to_string(),
            position: None,
        }
    }

    #[test]
    fn test_not_detected_is_empty_skid() {
        let drafts = ResultBuilder.build("a.jpg", &[candidate("@AB1234")], false);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].exclusion, ExclusionStatus::EmptySkid);
        assert!(drafts[0].unique_id.is_none());
        assert!(drafts[0].quantity.is_none());
    }

    #[test]
    fn test_detected_without_candidates_is_sticker_not_found() {
        let drafts = ResultBuilder.build("a.jpg", &[], true);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].exclusion, ExclusionStatus::StickerNotFound);
        assert!(drafts[0].unique_id.is_none());
    }

    #[test]
    fn test_detected_with_one_candidate_is_filled() {
        let drafts = ResultBuilder.build("a.jpg", &[candidate("@AB1234")], true);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].exclusion, ExclusionStatus::Filled);
        assert_eq!(drafts[0].unique_id.as_deref(), Some("@AB1234"));
        assert_eq!(drafts[0].quantity, Some(1));
    }

    #[test]
    fn test_multiple_candidates_reports_only_the_first() {
        let candidates = [
            candidate("@AB1234"),
            candidate("@CD5678"),
            candidate("@EF9012"),
        ];
        let drafts = ResultBuilder.build("a.jpg", &candidates, true);

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].exclusion, ExclusionStatus::Filled);
        assert_eq!(drafts[0].unique_id.as_deref(), Some("@AB1234"));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(ExclusionStatus::Filled.as_str(), "");
        assert_eq!(ExclusionStatus::EmptySkid.as_str(), "Empty Skid");
        assert_eq!(ExclusionStatus::StickerNotFound.as_str(), "Sticker not found");
        assert_eq!(
            ExclusionStatus::MultipleStickers.as_str(),
            "Multiple stickers detected"
        );
        assert_eq!(ExclusionStatus::Other.as_str(), "Other");
    }

    #[test]
    fn test_image_name_carried_through() {
        let drafts = ResultBuilder.build("skid_042.png", &[], false);
        assert_eq!(drafts[0].image_name, "skid_042.png");
    }
}
