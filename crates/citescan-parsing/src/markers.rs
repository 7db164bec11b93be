use citescan_core::{CitationMention, Detector, ParseBranch, VerificationStatus};

/// Literal token an upstream text generator inserts next to claims it could not source.
pub const UNVERIFIED_MARKER: &str = "[UNVERIFIED]";

pub const UNVERIFIED_NOTE: &str =
    "The text generator flagged this passage as uncertain; no source was confirmed for it.";

/// One `unverified` mention per occurrence of [`UNVERIFIED_MARKER`].
pub fn find_unverified_markers(text: &str) -> Vec<CitationMention> {
    text.match_indices(UNVERIFIED_MARKER)
        .map(|(offset, raw)| {
            let mut m = CitationMention::new(raw, offset, Detector::Marker, ParseBranch::Fallback);
            m.status = VerificationStatus::Unverified;
            m.note = Some(UNVERIFIED_NOTE.to_string());
            m
        })
        .collect()
}

/// Number of [`UNVERIFIED_MARKER`] occurrences in `text`.
pub fn count_unverified_markers(text: &str) -> usize {
    text.matches(UNVERIFIED_MARKER).count()
}
