use once_cell::sync::Lazy;
use regex::Regex;

use citescan_core::Identifiers;

/// Kind of structured identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Doi,
    PubMed,
    Arxiv,
}

/// An identifier found in text, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMatch {
    pub kind: IdentifierKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

/// Strip unbalanced trailing parentheses, brackets, and braces from a DOI.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);

    for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
        while doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
            doi = &doi[..doi.len() - 1];
            doi = doi.trim_end_matches(['.', ',', ';', ':']);
        }
    }

    doi.to_string()
}

static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s\]>},<]+").unwrap());

static ARXIV_NEW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\barXiv:?\s*|arxiv\.org/abs/)?\b(\d{4}\.\d{4,5}(?:v\d+)?)\b").unwrap()
});

static ARXIV_OLD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\barXiv:?\s*|arxiv\.org/abs/)([a-z-]+(?:\.[a-z]{2})?/\d{7}(?:v\d+)?)")
        .unwrap()
});

static PMID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bPMID:?\s*)?\b(\d{7,8})\b").unwrap());

/// Find every DOI, arXiv ID and PubMed ID in `text`, sorted by position.
///
/// Handles formats like:
/// - `10.1234/example`, `doi:10.1234/example`, `https://doi.org/10.1234/example`
/// - `arXiv:2301.12345v2`, `arxiv.org/abs/2301.12345`, `arXiv:hep-th/9901001`, bare `2301.12345`
/// - `PMID: 12345678`, bare 7–8 digit numbers
///
/// A bare number inside a DOI or arXiv ID (e.g. the `3450048` in
/// `10.1145/3442381.3450048`) is not reported as a PubMed ID.
pub fn find_identifiers(text: &str) -> Vec<IdentifierMatch> {
    let mut found: Vec<IdentifierMatch> = Vec::new();

    for m in DOI_RE.find_iter(text) {
        let value = clean_doi(m.as_str());
        found.push(IdentifierMatch {
            kind: IdentifierKind::Doi,
            start: m.start(),
            end: m.start() + value.len(),
            value,
        });
    }

    for re in [&*ARXIV_NEW_RE, &*ARXIV_OLD_RE] {
        for caps in re.captures_iter(text) {
            let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            found.push(IdentifierMatch {
                kind: IdentifierKind::Arxiv,
                value: id.as_str().to_string(),
                start: whole.start(),
                end: whole.end(),
            });
        }
    }

    let structured_spans: Vec<(usize, usize)> = found.iter().map(|m| (m.start, m.end)).collect();
    for caps in PMID_RE.captures_iter(text) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let inside_other = structured_spans
            .iter()
            .any(|&(s, e)| id.start() < e && s < id.end());
        if inside_other || is_part_of_number(text, id.start(), id.end()) {
            continue;
        }
        found.push(IdentifierMatch {
            kind: IdentifierKind::PubMed,
            value: id.as_str().to_string(),
            start: whole.start(),
            end: whole.end(),
        });
    }

    found.sort_by_key(|m| (m.start, m.end));
    found
}

/// Whether the digit run at `start..end` continues a larger number such as
/// `1.2345678`, `12,345,678` or `555-1234567`.
fn is_part_of_number(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let before2 = text[..start].chars().rev().nth(1);
    let after = text[end..].chars().next();
    let after2 = text[end..].chars().nth(1);

    let joins = |sep: Option<char>, digit: Option<char>| {
        matches!(sep, Some('.' | ',' | '-' | '/')) && digit.is_some_and(|c| c.is_ascii_digit())
    };
    joins(before, before2) || joins(after, after2)
}

/// Collapse matches into one [`Identifiers`] value, keeping the first of each kind.
pub fn collect_identifiers<'a>(matches: impl IntoIterator<Item = &'a IdentifierMatch>) -> Identifiers {
    let mut ids = Identifiers::default();
    for m in matches {
        let slot = match m.kind {
            IdentifierKind::Doi => &mut ids.doi,
            IdentifierKind::PubMed => &mut ids.pubmed_id,
            IdentifierKind::Arxiv => &mut ids.arxiv_id,
        };
        if slot.is_none() {
            *slot = Some(m.value.clone());
        }
    }
    ids
}

/// The value `ids` already holds for identifiers of `kind`, if any.
pub fn value_of(ids: &Identifiers, kind: IdentifierKind) -> Option<&str> {
    match kind {
        IdentifierKind::Doi => ids.doi.as_deref(),
        IdentifierKind::PubMed => ids.pubmed_id.as_deref(),
        IdentifierKind::Arxiv => ids.arxiv_id.as_deref(),
    }
}

/// Extract the first DOI from text.
pub fn extract_doi(text: &str) -> Option<String> {
    first_of(text, IdentifierKind::Doi)
}

/// Extract the first arXiv ID from text.
pub fn extract_arxiv_id(text: &str) -> Option<String> {
    first_of(text, IdentifierKind::Arxiv)
}

/// Extract the first PubMed ID from text.
pub fn extract_pubmed_id(text: &str) -> Option<String> {
    first_of(text, IdentifierKind::PubMed)
}

fn first_of(text: &str, kind: IdentifierKind) -> Option<String> {
    find_identifiers(text)
        .into_iter()
        .find(|m| m.kind == kind)
        .map(|m| m.value)
}
