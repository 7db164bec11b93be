//! Second citation family: bracketed `(Author, Year)` mentions.
//!
//! Five sub-patterns, tried in order from strict to loose. Every match is
//! returned; deduplication against earlier mentions happens in the extractor.

use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::{CitationMention, CitationStyle, Detector, ParseBranch};

use crate::authors::{NAME, parse_authors_with_config};
use crate::config::ParsingConfig;

/// One of the bracketed sub-patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketedPattern {
    /// `(Smith, 2020)`
    Single,
    /// `(Smith & Jones, 2020)`
    Pair,
    /// `(Smith et al., 2020)`
    EtAl,
    /// `(Smith, 2020, p. 14)`
    WithPage,
    /// `(World Health Organization, 2019)`
    Organization,
}

impl BracketedPattern {
    pub const ALL: [BracketedPattern; 5] = [
        BracketedPattern::Single,
        BracketedPattern::Pair,
        BracketedPattern::EtAl,
        BracketedPattern::WithPage,
        BracketedPattern::Organization,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            Self::Single => &SINGLE_RE,
            Self::Pair => &PAIR_RE,
            Self::EtAl => &ET_AL_RE,
            Self::WithPage => &WITH_PAGE_RE,
            Self::Organization => &ORGANIZATION_RE,
        }
    }
}

const YEAR: &str = r"(?P<year>(?:19|20)\d{2})[a-z]?";

static SINGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"\((?P<authors>{NAME}),\s*{YEAR}\)")).unwrap());

static PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\((?P<authors>{NAME}\s*&\s*{NAME}),\s*{YEAR}\)")).unwrap()
});

static ET_AL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\((?P<authors>{NAME}\s+et\s+al\.?),\s*{YEAR}\)")).unwrap()
});

static WITH_PAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\((?P<authors>{NAME}(?:\s*&\s*{NAME}|\s+et\s+al\.?)?),\s*{YEAR},\s*(?P<pages>pp?\.\s*\d+(?:\s*[-–]\s*\d+)?)\)"
    ))
    .unwrap()
});

static ORGANIZATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\((?P<authors>{NAME}(?:\s+(?:of|for|on|the|{NAME}))+),\s*{YEAR}\)"
    ))
    .unwrap()
});

/// Every bracketed mention in `text`, grouped by sub-pattern in
/// [`BracketedPattern::ALL`] order and in text order within each group.
pub fn find_bracketed(text: &str, config: &ParsingConfig) -> Vec<CitationMention> {
    let mut out = Vec::new();
    for pattern in BracketedPattern::ALL {
        for caps in pattern.regex().captures_iter(text) {
            let (Some(whole), Some(auth)) = (caps.get(0), caps.name("authors")) else {
                continue;
            };
            let authors = if pattern == BracketedPattern::Organization {
                crate::authors::ParsedAuthors {
                    names: vec![auth.as_str().to_string()],
                    has_et_al: false,
                }
            } else {
                parse_authors_with_config(auth.as_str(), config)
            };
            if authors.names.is_empty()
                || authors
                    .names
                    .first()
                    .and_then(|n| n.split_whitespace().next())
                    .is_some_and(|w| config.is_name_stopword(w))
            {
                continue;
            }

            let mut m = CitationMention::new(
                whole.as_str(),
                whole.start(),
                Detector::Bracketed,
                ParseBranch::InlineParenthetical,
            );
            m.style = CitationStyle::ApaInline;
            m.authors = authors.names;
            m.has_et_al = authors.has_et_al;
            m.year = caps.name("year").and_then(|y| y.as_str().parse().ok());
            m.pages = caps.name("pages").map(|p| p.as_str().to_string());
            out.push(m);
        }
    }
    out
}
