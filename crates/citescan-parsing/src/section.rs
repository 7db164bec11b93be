use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::{ReferenceListEntry, VerificationStatus};

use crate::config::{DEFAULT_REFERENCE_HEADINGS, ParsingConfig, heading_regex};

static DEFAULT_HEADING_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_REFERENCE_HEADINGS
        .iter()
        .map(|h| heading_regex(h).unwrap())
        .collect()
});

/// Locate the reference-list block in `text`.
///
/// Headings are tried in priority order (References, Bibliography, Works
/// Cited) and the first occurrence of the first heading present wins, even
/// if a lower-priority heading appears earlier in the text. The block runs
/// from the line after the heading up to the next blank line or end of
/// text; blank lines directly under the heading are skipped.
pub fn find_reference_section(text: &str) -> Option<&str> {
    find_reference_section_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`find_reference_section`].
pub(crate) fn find_reference_section_with_config<'a>(
    text: &'a str,
    config: &ParsingConfig,
) -> Option<&'a str> {
    let heading_res = config.heading_res.as_deref().unwrap_or(&DEFAULT_HEADING_RES);
    let heading = heading_res.iter().find_map(|re| re.find(text))?;
    let rest = &text[heading.end()..];

    let mut start = None;
    let mut end = rest.len();
    let mut pos = 0;
    for line in rest.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        match (start, blank) {
            (None, true) => {}
            (None, false) => start = Some(pos),
            (Some(_), true) => {
                end = pos;
                break;
            }
            (Some(_), false) => {}
        }
        pos += line.len();
    }

    let start = start?;
    Some(&rest[start..end])
}

/// Extract reference-list entries from `text`.
///
/// Lines of the detected block are trimmed, and empty lines and lines of
/// `min_reference_chars` characters or fewer (default 20) are dropped.
/// Ordinals are 1-based over the kept lines. Every entry starts `pending`.
pub fn extract_reference_list(text: &str) -> Vec<ReferenceListEntry> {
    extract_reference_list_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`extract_reference_list`].
pub(crate) fn extract_reference_list_with_config(
    text: &str,
    config: &ParsingConfig,
) -> Vec<ReferenceListEntry> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let Some(block) = find_reference_section_with_config(text, config) else {
        return Vec::new();
    };

    block
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > config.min_reference_chars)
        .enumerate()
        .map(|(i, line)| ReferenceListEntry {
            ordinal: i + 1,
            text: line.to_string(),
            status: VerificationStatus::Pending,
        })
        .collect()
}
