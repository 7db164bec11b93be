use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::{
    CitationMention, DeduplicationKey, ExtractionReport, ReferenceListEntry, summarize,
};

use crate::budget::Budget;
use crate::config::ParsingConfig;
use crate::{ParsingError, bracketed, classify, markers, section};

/// Line and block boundaries the cascade runs between.
static SEGMENT_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\n|</p\s*>|<br\s*/?>|</li\s*>|</div\s*>").unwrap());

/// Split `text` into non-blank segments, each with its byte offset.
pub fn segments(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in SEGMENT_BREAK_RE.find_iter(text) {
        push_segment(&mut out, text, start, m.start());
        start = m.end();
    }
    push_segment(&mut out, text, start, text.len());
    out
}

fn push_segment<'a>(out: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
    let seg = &text[start..end];
    if !seg.trim().is_empty() {
        out.push((start, seg));
    }
}

/// Accumulates mentions for one extraction call, dropping in-text
/// duplicates by [`DeduplicationKey`]. The first occurrence is kept as is.
/// A duplicate carrying identifiers is kept so its identifiers are not lost.
#[derive(Debug, Default)]
struct MentionSink {
    mentions: Vec<CitationMention>,
    seen: HashSet<DeduplicationKey>,
    duplicates: usize,
}

impl MentionSink {
    fn push(&mut self, mention: CitationMention) {
        if mention.is_in_text() {
            let key = mention.dedup_key();
            if self.seen.contains(&key) && mention.identifiers.is_empty() {
                tracing::trace!(
                    raw = %mention.raw_text,
                    author = %key.author,
                    year = ?key.year,
                    "dropping duplicate mention"
                );
                self.duplicates += 1;
                return;
            }
            self.seen.insert(key);
        }
        self.mentions.push(mention);
    }
}

/// A configurable citation extraction pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline operation as a method.
/// Use [`CitationExtractor::with_config`] to supply custom headings, stop
/// words or limits.
pub struct CitationExtractor {
    config: ParsingConfig,
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParsingConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Detect every citation mention in `text`.
    ///
    /// Runs the classifier cascade over each line or block, then the
    /// bracketed `(Author, Year)` family over the whole text, then collects
    /// `[UNVERIFIED]` markers. In-text mentions are deduplicated by
    /// (author, year), first occurrence wins.
    ///
    /// Never fails. When the processing budget runs out the remaining
    /// segments contribute no mentions; markers are always collected.
    pub fn extract_mentions(&self, text: &str) -> Vec<CitationMention> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let budget = Budget::for_input(text.len(), &self.config);
        let mut sink = MentionSink::default();
        let mut out_of_time = false;

        let segs = segments(text);
        for (i, (offset, segment)) in segs.iter().enumerate() {
            if budget.expired() {
                tracing::warn!(
                    skipped_segments = segs.len() - i,
                    "processing budget expired; remaining segments treated as having no mentions"
                );
                out_of_time = true;
                break;
            }
            for mention in classify::classify_segment(segment, *offset, &self.config) {
                sink.push(mention);
            }
        }
        tracing::debug!(
            segments = segs.len(),
            mentions = sink.mentions.len(),
            "cascade complete"
        );

        if out_of_time || budget.expired() {
            if !out_of_time {
                tracing::warn!("processing budget expired; skipping bracketed citations");
            }
        } else {
            let before = sink.mentions.len();
            for mention in bracketed::find_bracketed(text, &self.config) {
                sink.push(mention);
            }
            tracing::debug!(
                added = sink.mentions.len() - before,
                "bracketed citations complete"
            );
        }

        let markers = markers::find_unverified_markers(text);
        tracing::debug!(markers = markers.len(), duplicates = sink.duplicates, "markers complete");
        sink.mentions.extend(markers);

        sink.mentions
    }

    /// Extract the entries of the first detected reference list.
    pub fn extract_reference_list(&self, text: &str) -> Vec<ReferenceListEntry> {
        let entries = section::extract_reference_list_with_config(text, &self.config);
        tracing::debug!(entries = entries.len(), "reference list extracted");
        entries
    }

    /// Run both extraction operations and summarize the mentions.
    pub fn extract(&self, text: &str) -> ExtractionReport {
        let mentions = self.extract_mentions(text);
        let references = self.extract_reference_list(text);
        let summary = summarize(&mentions);
        ExtractionReport {
            mentions,
            references,
            summary,
        }
    }

    /// Read `path` as UTF-8 and run [`extract`](Self::extract) on it.
    pub fn extract_file(&self, path: &Path) -> Result<ExtractionReport, ParsingError> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.extract(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescan_core::{CitationStyle, Detector, VerificationStatus};
    use std::time::Duration;

    fn extract(text: &str) -> Vec<CitationMention> {
        CitationExtractor::new().extract_mentions(text)
    }

    #[test]
    fn test_segments_offsets() {
        let text = "one\n\ntwo</p><p>three<br/>four";
        let segs = segments(text);
        let texts: Vec<&str> = segs.iter().map(|(_, s)| *s).collect();
        assert_eq!(texts, vec!["one", "two", "<p>three", "four"]);
        for (offset, seg) in segs {
            assert_eq!(&text[offset..offset + seg.len()], seg);
        }
    }

    #[test]
    fn test_single_parenthetical() {
        let mentions = extract("(Smith, 2023)");
        assert_eq!(mentions.len(), 1);
        let m = &mentions[0];
        assert_eq!(m.authors, vec!["Smith"]);
        assert_eq!(m.year, Some(2023));
        assert_eq!(m.confidence, 0.6);
        assert_eq!(m.style, CitationStyle::ApaInline);
        assert_eq!(m.detector, Detector::Cascade);
    }

    #[test]
    fn test_repeated_mention_deduplicated() {
        let mentions = extract("First (Smith, 2023). Later (Smith, 2023).");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].offset, 6);
    }

    #[test]
    fn test_distinct_keys_kept() {
        let mentions = extract("(Smith & Jones, 2023) and then (Smith, 2023)");
        assert_eq!(mentions.len(), 2);
    }

    #[test]
    fn test_narrative_and_parenthetical_share_key() {
        let mentions = extract("Smith (2020) argued this.\nOthers agree (Smith, 2020).");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].raw_text, "Smith (2020)");
    }

    #[test]
    fn test_duplicate_with_doi_kept() {
        let mentions = extract("Claim (Smith, 2023).\nMore (Smith, 2023) doi:10.1000/xyz");
        assert_eq!(mentions.len(), 2);
        assert!(mentions[0].identifiers.is_empty());
        assert_eq!(mentions[1].identifiers.doi.as_deref(), Some("10.1000/xyz"));
        assert!(mentions[1].confidence >= 0.9);
    }

    #[test]
    fn test_plain_duplicate_after_doi_mention_dropped() {
        let mentions = extract("Claim (Smith, 2023) doi:10.1000/xyz\nMore (Smith, 2023).");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].identifiers.doi.as_deref(), Some("10.1000/xyz"));
    }

    #[test]
    fn test_bracketed_page_form_added() {
        let mentions = extract("As argued (Lee, 2019, p. 7).");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].detector, Detector::Bracketed);
        assert_eq!(mentions[0].pages.as_deref(), Some("p. 7"));
    }

    #[test]
    fn test_markers_appended_last() {
        let mentions = extract("A claim [UNVERIFIED] and (Smith, 2023).");
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[1].status, VerificationStatus::Unverified);
        assert_eq!(mentions[1].detector, Detector::Marker);
    }

    #[test]
    fn test_expired_budget_keeps_only_markers() {
        let config = crate::ParsingConfigBuilder::new()
            .budget_base(Duration::ZERO)
            .budget_per_kib(Duration::ZERO)
            .build()
            .unwrap();
        let extractor = CitationExtractor::with_config(config);
        let mentions = extractor.extract_mentions("(Smith, 2023) claim [UNVERIFIED]");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].status, VerificationStatus::Unverified);
    }

    #[test]
    fn test_whitespace_only() {
        assert!(extract(" \n\t ").is_empty());
    }

    #[test]
    fn test_extract_report_summary() {
        let report = CitationExtractor::new()
            .extract("(Smith, 2023) [UNVERIFIED]\n\nReferences\nSmith, J. (2023). A long enough title.\n");
        assert_eq!(report.references.len(), 1);
        assert_eq!(report.summary.total, report.mentions.len());
        assert_eq!(report.summary.unverified, 1);
    }

    #[test]
    fn test_extract_file_missing() {
        let result = CitationExtractor::new().extract_file(Path::new("/nonexistent/chapter.txt"));
        assert!(matches!(result, Err(ParsingError::Io(_))));
    }
}
