//! Tag stripping and word/sentence/paragraph statistics for chapter content.

use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::CitationMention;

use crate::markers::count_unverified_markers;

/// Closers that end a paragraph.
static BLOCK_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(?:p|div|h[1-6]|blockquote)\s*>").unwrap());

/// Closers and breaks that only end a line.
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(?:li|tr)\s*>|<br\s*/?>").unwrap());

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

static SENTENCE_END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

static PARAGRAPH_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Remove HTML tags, keeping block boundaries as blank lines and `<br>`,
/// list items and table rows as line breaks.
///
/// Decodes `&amp; &lt; &gt; &quot; &#39; &nbsp;` and collapses runs of
/// blank lines to a single blank line.
pub fn strip_tags(html: &str) -> String {
    let text = BLOCK_BREAK_RE.replace_all(html, "\n\n");
    let text = LINE_BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    BLANK_RUN_RE.replace_all(&text, "\n\n").trim().to_string()
}

/// Size and shape of a piece of chapter content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStats {
    pub characters: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub average_sentence_words: f64,
    pub unverified_markers: usize,
}

fn has_word_char(s: &str) -> bool {
    s.chars().any(char::is_alphanumeric)
}

/// Compute [`ContentStats`] for `text`. Tags are stripped first.
pub fn analyze(text: &str) -> ContentStats {
    let plain = strip_tags(text);
    if plain.is_empty() {
        return ContentStats::default();
    }

    let words = plain.split_whitespace().filter(|w| has_word_char(w)).count();
    let sentences = SENTENCE_END_RE
        .split(&plain)
        .filter(|s| has_word_char(s))
        .count();
    let paragraphs = PARAGRAPH_BREAK_RE
        .split(&plain)
        .filter(|p| has_word_char(p))
        .count();

    ContentStats {
        characters: plain.chars().count(),
        words,
        sentences,
        paragraphs,
        average_sentence_words: if sentences == 0 {
            0.0
        } else {
            words as f64 / sentences as f64
        },
        unverified_markers: count_unverified_markers(&plain),
    }
}

/// In-text mentions per 1000 words; zero for content with no words.
pub fn citation_density(stats: &ContentStats, mentions: &[CitationMention]) -> f64 {
    if stats.words == 0 {
        return 0.0;
    }
    let in_text = mentions.iter().filter(|m| m.is_in_text()).count();
    in_text as f64 * 1000.0 / stats.words as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use citescan_core::{CitationStyle, Detector, ParseBranch};

    #[test]
    fn test_strip_tags_blocks_and_entities() {
        let html = "<h2>Intro</h2><p>Tom &amp; Jerry</p><p>a&nbsp;&lt;b&gt;<br/>next</p>";
        assert_eq!(strip_tags(html), "Intro\n\nTom & Jerry\n\na <b>\nnext");
    }

    #[test]
    fn test_strip_tags_list_items_stay_on_lines() {
        assert_eq!(strip_tags("<ul><li>one</li><li>two</li></ul>"), "one\ntwo");
    }

    #[test]
    fn test_strip_tags_collapses_blank_runs() {
        assert_eq!(strip_tags("one\n\n\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn test_strip_tags_inline_markup() {
        assert_eq!(strip_tags("an <em>italic</em> word"), "an italic word");
    }

    #[test]
    fn test_analyze_counts() {
        let text = "First sentence here. Second one!\n\nNew paragraph? Yes [UNVERIFIED].";
        let stats = analyze(text);
        assert_eq!(stats.words, 9);
        assert_eq!(stats.sentences, 4);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.unverified_markers, 1);
        assert!((stats.average_sentence_words - 2.25).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_html() {
        let stats = analyze("<p>One two.</p><p>Three.</p>");
        assert_eq!(stats.words, 3);
        assert_eq!(stats.sentences, 2);
        assert_eq!(stats.paragraphs, 2);
    }

    #[test]
    fn test_analyze_html_paragraphs_and_line_breaks() {
        let stats = analyze(
            "<p>First paragraph here.</p><p>Second paragraph here.</p><p>Third one.<br>Same paragraph.</p>",
        );
        assert_eq!(stats.paragraphs, 3);
        assert_eq!(stats.sentences, 4);
    }

    #[test]
    fn test_analyze_empty() {
        assert_eq!(analyze("   "), ContentStats::default());
        assert_eq!(analyze("<p></p>"), ContentStats::default());
    }

    #[test]
    fn test_citation_density() {
        let stats = ContentStats {
            words: 500,
            ..Default::default()
        };
        let mut inline = CitationMention::new(
            "(Smith, 2020)",
            0,
            Detector::Bracketed,
            ParseBranch::InlineParenthetical,
        );
        inline.style = CitationStyle::ApaInline;
        let full = CitationMention::new("x", 0, Detector::Cascade, ParseBranch::FullBibliographic);
        let density = citation_density(&stats, &[inline.clone(), inline, full]);
        assert!((density - 4.0).abs() < 1e-9);
        assert_eq!(citation_density(&ContentStats::default(), &[]), 0.0);
    }
}
