//! Ordered classifier cascade for one text segment.
//!
//! Each [`Classifier`] proposes candidate spans. Classifiers run in the fixed
//! order of [`Classifier::CASCADE`] and a span claimed by an earlier
//! classifier cannot be claimed again, so every candidate is classified once.
//! Segments with no classified span fall through to [`fallback`], and
//! identifiers found anywhere in the segment are attached afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::{
    CitationMention, CitationStyle, Detector, Identifiers, ParseBranch,
};

use crate::authors::{self, NAME, ParsedAuthors, author_list_pattern, parse_authors_with_config};
use crate::config::ParsingConfig;
use crate::identifiers::{self, IdentifierMatch};

/// What a classifier recognised in a span.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Only structured identifiers were found.
    Identified(Identifiers),
    /// A complete APA or MLA reference.
    FullBibliographic(Bibliographic),
    /// `Author (Year)` or `(Author, Year)`.
    InlineParenthetical { authors: ParsedAuthors, year: Option<u16> },
    /// Whatever could be recovered from an unrecognised reference.
    Fallback {
        authors: ParsedAuthors,
        year: Option<u16>,
        title: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bibliographic {
    pub style: CitationStyle,
    pub authors: ParsedAuthors,
    pub year: Option<u16>,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
}

/// A classified span, with offsets relative to the segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub start: usize,
    pub end: usize,
    pub classified: Classified,
}

impl Candidate {
    fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Build the mention for this candidate. `segment_offset` is the
    /// segment's byte offset in the full input.
    pub fn into_mention(self, segment: &str, segment_offset: usize) -> CitationMention {
        let raw = &segment[self.start..self.end];
        let offset = segment_offset + self.start;
        match self.classified {
            Classified::Identified(ids) => {
                let mut m = CitationMention::new(raw, offset, Detector::Cascade, ParseBranch::Fallback);
                m.attach_identifiers(ids);
                m
            }
            Classified::FullBibliographic(b) => {
                let mut m = CitationMention::new(
                    raw,
                    offset,
                    Detector::Cascade,
                    ParseBranch::FullBibliographic,
                );
                m.style = b.style;
                m.authors = b.authors.names;
                m.has_et_al = b.authors.has_et_al;
                m.year = b.year;
                m.title = b.title;
                m.journal = b.journal;
                m.volume = b.volume;
                m.issue = b.issue;
                m.pages = b.pages;
                m
            }
            Classified::InlineParenthetical { authors, year } => {
                let mut m = CitationMention::new(
                    raw,
                    offset,
                    Detector::Cascade,
                    ParseBranch::InlineParenthetical,
                );
                m.style = CitationStyle::ApaInline;
                m.authors = authors.names;
                m.has_et_al = authors.has_et_al;
                m.year = year;
                m
            }
            Classified::Fallback {
                authors,
                year,
                title,
            } => {
                let mut m = CitationMention::new(raw, offset, Detector::Cascade, ParseBranch::Fallback);
                m.authors = authors.names;
                m.has_et_al = authors.has_et_al;
                m.year = year;
                m.title = title;
                m
            }
        }
    }
}

/// Span classifiers, tried in [`Classifier::CASCADE`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classifier {
    /// `Author(s) (Year). Title. Journal, Volume(Issue), Pages.`
    ApaFull,
    /// `Author(s). "Title." Journal, vol. N, no. N, Year, pp. Pages`
    MlaFull,
    /// `Author(s) (Year)`
    Narrative,
    /// `(Author(s), Year)`, possibly several separated by `;`
    Parenthetical,
}

impl Classifier {
    pub const CASCADE: [Classifier; 4] = [
        Classifier::ApaFull,
        Classifier::MlaFull,
        Classifier::Narrative,
        Classifier::Parenthetical,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ApaFull => "apa_full",
            Self::MlaFull => "mla_full",
            Self::Narrative => "narrative",
            Self::Parenthetical => "parenthetical",
        }
    }

    /// All spans in `segment` this classifier recognises.
    pub fn find(&self, segment: &str, config: &ParsingConfig) -> Vec<Candidate> {
        match self {
            Self::ApaFull => find_apa_full(segment, config),
            Self::MlaFull => find_mla_full(segment, config),
            Self::Narrative => find_narrative(segment, config),
            Self::Parenthetical => find_parenthetical(segment, config),
        }
    }
}

const YEAR: &str = r"(?:19|20)\d{2}";

static APA_FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<authors>{al})\s*\((?P<year>{YEAR})[a-z]?\)\.\s+(?P<title>[^.?!]+?)[.?!]\s+(?P<journal>\p{{L}}[^,.:/]*)(?:,\s*(?P<volume>\d+)(?:\((?P<issue>[^)]+)\))?)?(?:,\s*(?P<pages>[A-Za-z]?\d+(?:\s*[-–]\s*[A-Za-z]?\d+)?))?(?:\.|\s*$)",
        al = author_list_pattern(),
    ))
    .unwrap()
});

static MLA_FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?P<authors>{al})\.?\s+["“](?P<title>[^"”]+?)[.,!?]?["”]\s*(?P<journal>[^,"”.]+)?(?:,\s*vol\.\s*(?P<volume>\d+))?(?:,\s*no\.\s*(?P<issue>\d+))?(?:,\s*(?P<year>{YEAR}))?(?:,\s*pp?\.\s*(?P<pages>\d+(?:\s*[-–]\s*\d+)?))?"#,
        al = author_list_pattern(),
    ))
    .unwrap()
});

static NARRATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<authors>{NAME}(?:(?:\s*,?\s*&\s*|\s*,?\s+and\s+|\s*,\s*){NAME})*(?:\s+et\s+al\.?)?)\s+\((?P<year>{YEAR})[a-z]?\)"
    ))
    .unwrap()
});

static PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\((?P<body>[^()]*?\b{YEAR}[a-z]?)\)")).unwrap());

static PAREN_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(?:see also|see|e\.g\.|cf\.|i\.e\.),?\s+)?(?P<authors>\p{{Lu}}.*?),\s*(?P<year>{YEAR})[a-z]?\s*$"
    ))
    .unwrap()
});

fn opt_str(caps: &regex::Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn opt_year(caps: &regex::Captures<'_>) -> Option<u16> {
    caps.name("year").and_then(|m| m.as_str().parse().ok())
}

/// Number of leading bytes of `text` made up of stop words and separators,
/// e.g. `However, ` in `However, Smith (2020)`.
fn leading_stopword_len(text: &str, config: &ParsingConfig) -> usize {
    static WORD_SEP_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\p{L}+)(?:\s*,?\s*&\s*|\s*,?\s+and\s+|\s*,\s*|\s+)").unwrap());

    let mut skipped = 0;
    while let Some(caps) = WORD_SEP_RE.captures(&text[skipped..]) {
        let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if !config.is_name_stopword(word.as_str()) {
            break;
        }
        skipped += whole.end();
    }
    skipped
}

fn find_apa_full(segment: &str, config: &ParsingConfig) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in APA_FULL_RE.captures_iter(segment) {
        let (Some(whole), Some(auth)) = (caps.get(0), caps.name("authors")) else {
            continue;
        };
        let skip = leading_stopword_len(auth.as_str(), config);
        let authors = parse_authors_with_config(&auth.as_str()[skip..], config);
        if authors.names.is_empty() {
            continue;
        }
        out.push(Candidate {
            start: whole.start() + skip,
            end: whole.end(),
            classified: Classified::FullBibliographic(Bibliographic {
                style: CitationStyle::Apa,
                authors,
                year: opt_year(&caps),
                title: opt_str(&caps, "title"),
                journal: opt_str(&caps, "journal"),
                volume: opt_str(&caps, "volume"),
                issue: opt_str(&caps, "issue"),
                pages: opt_str(&caps, "pages"),
            }),
        });
    }
    out
}

fn find_mla_full(segment: &str, config: &ParsingConfig) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in MLA_FULL_RE.captures_iter(segment) {
        let (Some(whole), Some(auth)) = (caps.get(0), caps.name("authors")) else {
            continue;
        };
        let skip = leading_stopword_len(auth.as_str(), config);
        let authors = parse_authors_with_config(&auth.as_str()[skip..], config);
        if authors.names.is_empty() {
            continue;
        }
        let end = whole.start() + whole.as_str().trim_end().len();
        out.push(Candidate {
            start: whole.start() + skip,
            end,
            classified: Classified::FullBibliographic(Bibliographic {
                style: CitationStyle::Mla,
                authors,
                year: opt_year(&caps),
                title: opt_str(&caps, "title"),
                journal: opt_str(&caps, "journal"),
                volume: opt_str(&caps, "volume"),
                issue: opt_str(&caps, "issue"),
                pages: opt_str(&caps, "pages"),
            }),
        });
    }
    out
}

fn find_narrative(segment: &str, config: &ParsingConfig) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in NARRATIVE_RE.captures_iter(segment) {
        let (Some(whole), Some(auth)) = (caps.get(0), caps.name("authors")) else {
            continue;
        };
        let skip = leading_stopword_len(auth.as_str(), config);
        let authors = parse_authors_with_config(&auth.as_str()[skip..], config);
        if !authors::plausible_names(&authors.names, config) {
            continue;
        }
        out.push(Candidate {
            start: whole.start() + skip,
            end: whole.end(),
            classified: Classified::InlineParenthetical {
                authors,
                year: opt_year(&caps),
            },
        });
    }
    out
}

fn find_parenthetical(segment: &str, config: &ParsingConfig) -> Vec<Candidate> {
    let mut out = Vec::new();
    for caps in PAREN_RE.captures_iter(segment) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.name("body")) else {
            continue;
        };
        let parts: Vec<(usize, &str)> = split_with_offsets(body.as_str(), ';');
        let single = parts.len() == 1;

        for (part_offset, part) in parts {
            let Some(pcaps) = PAREN_PART_RE.captures(part) else {
                continue;
            };
            let Some(auth) = pcaps.name("authors") else {
                continue;
            };
            let authors = parse_authors_with_config(auth.as_str(), config);
            if !authors::plausible_names(&authors.names, config) {
                continue;
            }
            let (start, end) = if single {
                (whole.start(), whole.end())
            } else {
                let lead = part.len() - part.trim_start().len();
                let s = body.start() + part_offset + lead;
                (s, s + part.trim().len())
            };
            out.push(Candidate {
                start,
                end,
                classified: Classified::InlineParenthetical {
                    authors,
                    year: opt_year(&pcaps),
                },
            });
        }
    }
    out
}

fn split_with_offsets(text: &str, sep: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == sep {
            parts.push((start, &text[start..i]));
            start = i + c.len_utf8();
        }
    }
    parts.push((start, &text[start..]));
    parts
}

static LEADING_MARKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:<[^>]+>\s*)*(?:\[\d+\]|\d{1,3}\.|[-*•])?\s*").unwrap()
});

static YEAR_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"\b({YEAR})\b")).unwrap());

static PAREN_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"\(\s*{YEAR}")).unwrap());

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["“](?P<quoted>[^"”]{3,}?)[.,]?["”]|<(?:i|em)>(?P<italic>.+?)</(?:i|em)>"#).unwrap()
});

/// Best-effort field recovery for a segment that no classifier recognised.
///
/// Returns `None` when the segment does not look like a reference at all:
/// it needs a leading author name, a year, and either a quoted/italic title
/// or a parenthesised year.
pub fn fallback(segment: &str, config: &ParsingConfig) -> Option<Candidate> {
    let lead = LEADING_MARKUP_RE.find(segment).map_or(0, |m| m.end());
    let body = &segment[lead..];
    let trimmed_len = body.trim_end().len();
    if trimmed_len == 0 {
        return None;
    }

    let year = YEAR_TOKEN_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok());
    let title = TITLE_RE.captures(body).and_then(|c| {
        c.name("quoted")
            .or_else(|| c.name("italic"))
            .map(|m| m.as_str().trim().to_string())
    });
    let name_run = authors::leading_name_run(body, config);

    let shaped = name_run.is_some()
        && year.is_some()
        && (title.is_some() || PAREN_YEAR_RE.is_match(body));
    if !shaped {
        return None;
    }
    let authors = parse_authors_with_config(name_run?, config);

    Some(Candidate {
        start: lead,
        end: lead + trimmed_len,
        classified: Classified::Fallback {
            authors,
            year,
            title,
        },
    })
}

/// Run the cascade over one segment and return its mentions in text order.
pub fn classify_segment(
    segment: &str,
    segment_offset: usize,
    config: &ParsingConfig,
) -> Vec<CitationMention> {
    let ids = identifiers::find_identifiers(segment);

    let mut claimed: Vec<Candidate> = Vec::new();
    for classifier in Classifier::CASCADE {
        for candidate in classifier.find(segment, config) {
            if claimed.iter().any(|c| c.overlaps(&candidate)) {
                continue;
            }
            tracing::trace!(
                classifier = classifier.name(),
                span = &segment[candidate.start..candidate.end],
                "classified span"
            );
            claimed.push(candidate);
        }
    }

    if claimed.is_empty() {
        if let Some(candidate) = fallback(segment, config) {
            claimed.push(candidate);
        } else if !ids.is_empty() {
            let lead = segment.len() - segment.trim_start().len();
            claimed.push(Candidate {
                start: lead,
                end: segment.trim_end().len(),
                classified: Classified::Identified(identifiers::collect_identifiers(&ids)),
            });
        }
    }

    claimed.sort_by_key(|c| c.start);
    let mut mentions: Vec<CitationMention> = claimed
        .into_iter()
        .map(|c| c.into_mention(segment, segment_offset))
        .collect();

    attach_identifiers(&mut mentions, &ids, segment, segment_offset);
    mentions
}

/// Attach each identifier to the nearest mention starting at or before it,
/// or to the first mention of the segment when none precedes it.
///
/// A mention holds one identifier per kind. When the target already holds a
/// different value of that kind, the identifier becomes its own `Identified`
/// mention at the identifier's span, so no identifier is lost.
fn attach_identifiers(
    mentions: &mut Vec<CitationMention>,
    ids: &[IdentifierMatch],
    segment: &str,
    segment_offset: usize,
) {
    if mentions.is_empty() {
        return;
    }
    let mut split_off = false;
    for id in ids {
        let already_held = mentions
            .iter()
            .any(|m| identifiers::value_of(&m.identifiers, id.kind) == Some(id.value.as_str()));
        if already_held {
            continue;
        }

        let abs = segment_offset + id.start;
        let idx = mentions
            .iter()
            .rposition(|m| m.offset <= abs)
            .unwrap_or(0);
        if identifiers::value_of(&mentions[idx].identifiers, id.kind).is_none() {
            mentions[idx].attach_identifiers(identifiers::collect_identifiers([id]));
            continue;
        }

        tracing::trace!(value = %id.value, "identifier split into its own mention");
        let extra = Candidate {
            start: id.start,
            end: id.end,
            classified: Classified::Identified(identifiers::collect_identifiers([id])),
        };
        mentions.push(extra.into_mention(segment, segment_offset));
        split_off = true;
    }
    if split_off {
        mentions.sort_by_key(|m| m.offset);
    }
}
