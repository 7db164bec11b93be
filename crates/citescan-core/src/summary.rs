use serde::{Deserialize, Serialize};

use crate::{CitationMention, ReferenceListEntry, VerificationStatus};

/// Anything that carries a verification status.
pub trait HasStatus {
    fn status(&self) -> VerificationStatus;
}

impl HasStatus for CitationMention {
    fn status(&self) -> VerificationStatus {
        self.status
    }
}

impl HasStatus for ReferenceListEntry {
    fn status(&self) -> VerificationStatus {
        self.status
    }
}

/// Counts of items by verification status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSummary {
    pub total: usize,
    pub pending: usize,
    pub verified: usize,
    pub failed: usize,
    pub unverified: usize,
}

impl CitationSummary {
    /// Percentage of items that are either failed or flagged unverified.
    pub fn problematic_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.failed + self.unverified) as f64 / self.total as f64 * 100.0
        }
    }
}

/// Count items by status. Statuses with no items count as zero.
pub fn summarize<T: HasStatus>(items: &[T]) -> CitationSummary {
    let mut summary = CitationSummary {
        total: items.len(),
        ..Default::default()
    };
    for item in items {
        match item.status() {
            VerificationStatus::Pending => summary.pending += 1,
            VerificationStatus::Verified => summary.verified += 1,
            VerificationStatus::Failed => summary.failed += 1,
            VerificationStatus::Unverified => summary.unverified += 1,
        }
    }
    summary
}
